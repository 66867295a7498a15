use clap::Parser;
use tracing_subscriber::EnvFilter;

use cfe::cli::{Cli, Commands};

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => cfe::cli::commands::init::execute(&cli),
        Commands::Add {
            ref local,
            ref label,
        } => cfe::cli::commands::add::execute(&cli, local, label),
        Commands::Get {
            ref label,
            ref local,
            force,
        } => cfe::cli::commands::get::execute(&cli, label, local, force),
        Commands::List => cfe::cli::commands::list::execute(&cli),
        Commands::Delete { ref label, force } => {
            cfe::cli::commands::delete::execute(&cli, label, force)
        }
        Commands::Logout { force } => cfe::cli::commands::logout::execute(&cli, force),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            cfe::cli::commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        #[cfg(not(feature = "audit-log"))]
        Commands::Audit { .. } => Err(cfe::errors::CfeError::CommandFailed(
            "this build has no audit log (enable the `audit-log` feature)".into(),
        )),
        Commands::Completions { shell } => cfe::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        cfe::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `CFE_LOG` (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CFE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
