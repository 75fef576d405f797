use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::lifecycle::types::{GatepassFields, GatepassState, ItemLine, Role, UserStatus};

pub mod commands;

#[derive(Parser)]
#[command(name = "gatepass")]
#[command(about = "Material gatepass requests with admin and security approval")]
#[command(long_about = "Gatepass records requests to move material between locations and walks each \
                       request through admin approval, security approval or decline. Every change is \
                       audited. Start with 'gatepass user add' to register the people involved.")]
pub struct Cli {
    /// Configuration file to load instead of gatepass.toml / .gatepass-rc
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register users and manage their account status
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Request a new gatepass (requires the user role)
    Create {
        /// Acting user id
        #[arg(long = "as", value_name = "USER_ID", help = "Id of the user making the request")]
        actor: i64,
        #[command(flatten)]
        content: GatepassContent,
    },
    /// Approve a pending gatepass as admin
    ApproveAdmin {
        #[arg(long = "as", value_name = "USER_ID", help = "Id of the approving admin")]
        actor: i64,
        /// Gatepass id
        id: i64,
    },
    /// Approve an admin-approved gatepass as security
    ApproveSecurity {
        #[arg(long = "as", value_name = "USER_ID", help = "Id of the approving security user")]
        actor: i64,
        /// Gatepass id
        id: i64,
    },
    /// Decline a gatepass with a reason
    Decline {
        #[arg(long = "as", value_name = "USER_ID", help = "Id of the declining admin")]
        actor: i64,
        /// Gatepass id
        id: i64,
        #[arg(long, help = "Why the gatepass is declined (required)")]
        reason: String,
    },
    /// Replace the content of a pending gatepass
    Edit {
        #[arg(long = "as", value_name = "USER_ID", help = "Id of the creator or an admin")]
        actor: i64,
        /// Gatepass id
        id: i64,
        #[command(flatten)]
        content: GatepassContent,
    },
    /// Show one gatepass as JSON
    Show {
        /// Gatepass id
        #[arg(required_unless_present = "number")]
        id: Option<i64>,
        #[arg(long, conflicts_with = "id", help = "Look up by gatepass number instead of id")]
        number: Option<String>,
    },
    /// List gatepasses, newest first
    List {
        #[arg(long, help = "Only gatepasses in this state")]
        state: Option<GatepassState>,
        #[arg(long, value_name = "USER_ID", help = "Only gatepasses requested by this user")]
        created_by: Option<i64>,
        #[arg(long, default_value = "50", help = "Maximum number of gatepasses to show")]
        limit: u32,
    },
    /// Show the audit trail, newest first
    Audit {
        #[arg(long, value_name = "ID", help = "Only entries about this gatepass")]
        gatepass: Option<i64>,
        #[arg(long, default_value = "50", help = "Maximum number of entries to show")]
        limit: u32,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user
    Add {
        username: String,
        #[arg(long, help = "One of: user, admin, security, superadmin")]
        role: Role,
        #[arg(long, default_value = "active", help = "One of: active, inactive, pending")]
        status: UserStatus,
    },
    /// Change a user's account status
    Status {
        /// User id
        id: i64,
        status: UserStatus,
    },
    /// List registered users
    List,
}

/// Route and content of a gatepass as given on the command line
#[derive(Args, Debug, Clone)]
pub struct GatepassContent {
    #[arg(long, help = "Where the material leaves from")]
    pub from: String,
    #[arg(long, help = "Where the material goes")]
    pub to: String,
    #[arg(long, help = "Material type, e.g. returnable or non-returnable")]
    pub material_type: String,
    #[arg(long, help = "Why the material moves")]
    pub purpose: String,
    #[arg(long, value_parser = parse_requested_for, help = "Requested date and time, 'YYYY-MM-DD HH:MM'")]
    pub requested_for: NaiveDateTime,
    #[arg(long = "item", value_parser = parse_item, help = "Item line 'name:quantity:unit', repeatable")]
    pub items: Vec<ItemLine>,
}

impl GatepassContent {
    pub fn fields(&self) -> GatepassFields {
        GatepassFields {
            from_location: self.from.clone(),
            to_location: self.to.clone(),
            material_type: self.material_type.clone(),
            purpose: self.purpose.clone(),
            requested_for: self.requested_for,
        }
    }
}

/// Parse `name:quantity:unit`. The name may itself contain colons.
pub fn parse_item(raw: &str) -> Result<ItemLine, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (unit, quantity, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(unit), Some(quantity), Some(name)) => (unit, quantity, name),
        _ => return Err(format!("expected name:quantity:unit, got '{raw}'")),
    };
    let quantity: f64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("'{quantity}' is not a number"))?;
    Ok(ItemLine::new(name.trim(), quantity, unit.trim()))
}

pub fn parse_requested_for(raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw.trim(), format).ok())
        .ok_or_else(|| format!("'{raw}' is not a date like 2025-03-14 15:30"))
}
