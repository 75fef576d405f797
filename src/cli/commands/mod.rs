use anyhow::Result;
use std::sync::Arc;

use crate::config::GatepassConfig;
use crate::database::DatabaseManager;
use crate::lifecycle::LifecycleEngine;
use crate::notify::LogSink;
use crate::storage::SqliteGatepassStore;

pub mod audit;
pub mod gatepass;
pub mod users;

/// Everything a command needs: the open database and an engine on top of it
pub struct AppContext {
    pub engine: LifecycleEngine,
    pub store: SqliteGatepassStore,
    database: DatabaseManager,
}

impl AppContext {
    pub async fn open(config: &GatepassConfig) -> Result<Self> {
        let database = DatabaseManager::new(&config.database).await?;
        let store = SqliteGatepassStore::new(database.pool().clone());
        let engine = LifecycleEngine::for_sqlite(store.clone(), Arc::new(LogSink))
            .with_config(&config.lifecycle);

        Ok(Self {
            engine,
            store,
            database,
        })
    }

    pub async fn close(self) {
        self.database.shutdown().await;
    }
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("🎫 Gatepass - material movement approvals");
    println!();
    println!("To get started:");
    println!("  👤 gatepass user add alice --role user        # Register a requester");
    println!("  📝 gatepass create --as 1 --from ... --to ... # Request a gatepass");
    println!("  ✅ gatepass approve-admin --as 2 <ID>         # Admin approval");
    println!("  🛡️  gatepass approve-security --as 3 <ID>      # Security approval");
    println!();
    println!("Review:");
    println!("  📋 gatepass list        # Recent gatepasses");
    println!("  📜 gatepass audit       # Audit trail");
    println!();
    println!("💡 Run 'gatepass --help' for every option.");
    Ok(())
}
