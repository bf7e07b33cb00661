//! boltsync command line interface

mod cli;
mod commands;
mod errors;
mod tracing;

use crate::errors::CliError;
use crate::tracing::TracingConfig;
use std::io::Write;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
    })?;

    let store_path = cli.store.ok_or(CliError::StoreMissing)?;
    let store = commands::load_store(&store_path)?;
    let registry = commands::default_registry();

    let output = commands::execute(&cli.command, &store, &registry).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .map_err(CliError::output)?;

    Ok(())
}
