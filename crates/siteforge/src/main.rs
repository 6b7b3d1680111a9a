//! SiteForge storage administration CLI.
//!
//! Selects the storage backend once at startup (PostgreSQL, or flat files
//! when no database is configured or it cannot be reached), then runs one
//! administrative command.

mod commands;
mod config;

use clap::Parser;
use siteforge_persistence::tenant::DomainResolver;
use siteforge_persistence::{ErrorKind, StorageError, select_backend};
use tracing::info;

use crate::config::Cli;

/// Maps a failure to a process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<StorageError>().map(StorageError::kind) {
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::AlreadyExists) | Some(ErrorKind::ProtectedResource) => 4,
        Some(ErrorKind::Validation) | Some(ErrorKind::InvalidIdentifier) => 5,
        Some(ErrorKind::BackendUnavailable) => 6,
        _ => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let selected = select_backend(&cli.storage_config()).await?;

    info!(
        storage_backend = %selected.mode,
        fell_back = selected.fell_back,
        "storage selected"
    );

    let resolver = cli
        .platform_domain
        .iter()
        .fold(DomainResolver::new(selected.store.clone()), |resolver, domain| {
            resolver.with_platform_domain(domain)
        });

    commands::run(&cli.command, &selected, &resolver).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    config::init_logging(&cli.log_level);

    if let Err(errors) = cli.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(2);
    }

    match run(cli).await {
        Ok(output) => print!("{}", output),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(exit_code(&err));
        }
    }
}
