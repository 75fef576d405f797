use anyhow::Result;

use super::AppContext;
use crate::lifecycle::types::{Role, UserId, UserStatus};

pub struct AddUserCommand {
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
}

impl AddUserCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let user = ctx
            .store
            .create_user(&self.username, self.role, self.status)
            .await?;
        println!(
            "👤 User {} registered with id {} ({}, {})",
            user.username, user.id, user.role, user.status
        );
        Ok(())
    }
}

pub struct SetStatusCommand {
    pub id: UserId,
    pub status: UserStatus,
}

impl SetStatusCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        if !ctx.store.set_user_status(self.id, self.status).await? {
            anyhow::bail!("no user with id {}", self.id);
        }
        println!("👤 User {} is now {}", self.id, self.status);
        Ok(())
    }
}

pub struct ListUsersCommand;

impl ListUsersCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let users = ctx.store.list_users().await?;
        if users.is_empty() {
            println!("👥 No users registered");
            return Ok(());
        }

        println!("👥 USERS ({})", users.len());
        println!("──────────");
        for user in &users {
            println!("{:>5}  {:<20}  {:<10}  {}", user.id, user.username, user.role, user.status);
        }
        Ok(())
    }
}
