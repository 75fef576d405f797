use anyhow::Result;

use super::AppContext;
use crate::cli::GatepassContent;
use crate::lifecycle::types::{
    Action, Gatepass, GatepassFilter, GatepassId, TransitionOutcome, UserId,
};

pub struct CreateCommand {
    pub actor: UserId,
    pub content: GatepassContent,
}

impl CreateCommand {
    pub fn new(actor: UserId, content: GatepassContent) -> Self {
        Self { actor, content }
    }

    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let gatepass = ctx
            .engine
            .create_gatepass(self.actor, &self.content.fields(), &self.content.items)
            .await?;

        println!("✅ Gatepass {} created", gatepass.gatepass_number);
        print_summary(&gatepass);
        Ok(())
    }
}

/// Approve or decline one gatepass
pub struct TransitionCommand {
    pub actor: UserId,
    pub id: GatepassId,
    pub action: Action,
}

impl TransitionCommand {
    pub fn new(actor: UserId, id: GatepassId, action: Action) -> Self {
        Self { actor, id, action }
    }

    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let engine = &ctx.engine;
        let outcome = match &self.action {
            Action::ApproveAdmin => engine.approve_as_admin(self.actor, self.id).await?,
            Action::ApproveSecurity => engine.approve_as_security(self.actor, self.id).await?,
            Action::Decline { reason } => engine.decline(self.actor, self.id, reason).await?,
            Action::Edit => anyhow::bail!("use the edit command to change a gatepass"),
        };

        print_outcome(&outcome);
        Ok(())
    }
}

pub struct EditCommand {
    pub actor: UserId,
    pub id: GatepassId,
    pub content: GatepassContent,
}

impl EditCommand {
    pub fn new(actor: UserId, id: GatepassId, content: GatepassContent) -> Self {
        Self { actor, id, content }
    }

    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let gatepass = ctx
            .engine
            .edit_pending(self.actor, self.id, &self.content.fields(), &self.content.items)
            .await?;

        println!("✏️  Gatepass {} updated", gatepass.gatepass_number);
        print_summary(&gatepass);
        Ok(())
    }
}

pub struct ShowCommand {
    pub id: Option<GatepassId>,
    pub number: Option<String>,
}

impl ShowCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let gatepass = match (&self.number, self.id) {
            (Some(number), _) => ctx.engine.find_by_number(number).await?,
            (None, Some(id)) => ctx.engine.get_gatepass(id).await?,
            (None, None) => anyhow::bail!("give a gatepass id or --number"),
        };

        println!("{}", serde_json::to_string_pretty(&gatepass)?);
        Ok(())
    }
}

pub struct ListCommand {
    pub filter: GatepassFilter,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let gatepasses = ctx.engine.list_gatepasses(&self.filter).await?;
        if gatepasses.is_empty() {
            println!("📋 No gatepasses found");
            return Ok(());
        }

        println!("📋 GATEPASSES ({})", gatepasses.len());
        println!("────────────────");
        for gatepass in &gatepasses {
            println!(
                "{:>5}  {}  {:<20}  {} -> {}  ({} item(s))",
                gatepass.id,
                gatepass.gatepass_number,
                gatepass.state,
                gatepass.fields.from_location,
                gatepass.fields.to_location,
                gatepass.items.len()
            );
        }
        Ok(())
    }
}

fn print_summary(gatepass: &Gatepass) {
    println!("   🆔 Id: {}", gatepass.id);
    println!("   📍 Route: {} -> {}", gatepass.fields.from_location, gatepass.fields.to_location);
    println!("   📅 Requested for: {}", gatepass.fields.requested_for);
    println!("   📦 Items:");
    for item in &gatepass.items {
        println!("      - {} x {} {}", item.item_name, item.quantity, item.unit);
    }
    println!("   🔖 State: {}", gatepass.state);
}

fn print_outcome(outcome: &TransitionOutcome) {
    println!(
        "✅ Gatepass {}: {} -> {}",
        outcome.gatepass_number, outcome.previous_state, outcome.new_state
    );
    println!("   🕒 At: {}", outcome.at.to_rfc3339());
}
