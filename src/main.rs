use anyhow::Result;
use clap::Parser;

use gatepass::cli::commands::audit::AuditCommand;
use gatepass::cli::commands::gatepass::{
    CreateCommand, EditCommand, ListCommand, ShowCommand, TransitionCommand,
};
use gatepass::cli::commands::users::{AddUserCommand, ListUsersCommand, SetStatusCommand};
use gatepass::cli::commands::{show_how_to_get_started, AppContext};
use gatepass::cli::{Cli, Commands, UserCommands};
use gatepass::{init_telemetry, Action, GatepassConfig, GatepassError, GatepassFilter};

/// Exit status for failures that may succeed on a retry
const EXIT_TEMPFAIL: i32 = 75;

fn main() {
    let cli = Cli::parse();

    let outcome = load_config(cli.config.as_deref()).and_then(|config| {
        init_telemetry(&config.observability)?;
        tokio::runtime::Runtime::new()?.block_on(run(cli.command, &config))
    });

    if let Err(e) = outcome {
        let code = match e.downcast_ref::<GatepassError>() {
            Some(err) if err.is_retryable() => {
                tracing::warn!(kind = err.kind(), error = %err, "Command failed on storage");
                eprintln!("⚠️  {}", err.user_message());
                EXIT_TEMPFAIL
            }
            Some(err) => {
                tracing::debug!(kind = err.kind(), error = %err, "Command refused");
                eprintln!("❌ {}", err.user_message());
                1
            }
            None => {
                eprintln!("❌ {e:#}");
                1
            }
        };
        std::process::exit(code);
    }
}

fn load_config(path: Option<&str>) -> Result<GatepassConfig> {
    GatepassConfig::load_env_file()?;
    match path {
        Some(path) => GatepassConfig::load_from(path),
        None => GatepassConfig::load(),
    }
}

async fn run(command: Option<Commands>, config: &GatepassConfig) -> Result<()> {
    let Some(command) = command else {
        return show_how_to_get_started().await;
    };

    let ctx = AppContext::open(config).await?;
    let result = dispatch(command, &ctx).await;
    ctx.close().await;
    result
}

async fn dispatch(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::User { command } => match command {
            UserCommands::Add {
                username,
                role,
                status,
            } => {
                AddUserCommand {
                    username,
                    role,
                    status,
                }
                .execute(ctx)
                .await
            }
            UserCommands::Status { id, status } => {
                SetStatusCommand { id, status }.execute(ctx).await
            }
            UserCommands::List => ListUsersCommand.execute(ctx).await,
        },
        Commands::Create { actor, content } => {
            CreateCommand::new(actor, content).execute(ctx).await
        }
        Commands::ApproveAdmin { actor, id } => {
            TransitionCommand::new(actor, id, Action::ApproveAdmin)
                .execute(ctx)
                .await
        }
        Commands::ApproveSecurity { actor, id } => {
            TransitionCommand::new(actor, id, Action::ApproveSecurity)
                .execute(ctx)
                .await
        }
        Commands::Decline { actor, id, reason } => {
            TransitionCommand::new(actor, id, Action::Decline { reason })
                .execute(ctx)
                .await
        }
        Commands::Edit { actor, id, content } => {
            EditCommand::new(actor, id, content).execute(ctx).await
        }
        Commands::Show { id, number } => ShowCommand { id, number }.execute(ctx).await,
        Commands::List {
            state,
            created_by,
            limit,
        } => {
            ListCommand {
                filter: GatepassFilter {
                    state,
                    created_by,
                    limit: Some(limit),
                },
            }
            .execute(ctx)
            .await
        }
        Commands::Audit { gatepass, limit } => {
            AuditCommand { gatepass, limit }.execute(ctx).await
        }
    }
}
