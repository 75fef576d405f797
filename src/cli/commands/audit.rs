use anyhow::Result;

use super::AppContext;
use crate::lifecycle::types::GatepassId;

pub struct AuditCommand {
    pub gatepass: Option<GatepassId>,
    pub limit: u32,
}

impl AuditCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let entries = ctx.engine.audit_trail(self.gatepass, self.limit).await?;
        if entries.is_empty() {
            println!("📜 No audit entries");
            return Ok(());
        }

        println!("📜 AUDIT TRAIL ({})", entries.len());
        println!("───────────────");
        for entry in &entries {
            let actor = entry
                .actor_id
                .map(|id| format!("user {id}"))
                .unwrap_or_else(|| "system".to_string());
            println!(
                "{}  {:<18}  {:<10}  {}",
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.action,
                actor,
                entry.detail
            );
        }
        Ok(())
    }
}
