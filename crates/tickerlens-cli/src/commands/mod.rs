mod snapshot;

use tickerlens_core::SnapshotOutcome;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<SnapshotOutcome, CliError> {
    match &cli.command {
        Command::Snapshot(args) => snapshot::run(cli, args).await,
    }
}
