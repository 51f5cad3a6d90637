mod table;

use std::io::Write;

use tickerlens_core::SnapshotOutcome;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Write `outcome` to stdout in the requested format.
pub fn render(
    outcome: &SnapshotOutcome,
    format: OutputFormat,
    pretty: bool,
    rows: usize,
) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_outcome(&mut out, outcome, format, pretty, rows)?;
    out.flush()?;
    Ok(())
}

pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &SnapshotOutcome,
    format: OutputFormat,
    pretty: bool,
    rows: usize,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut *out, outcome)?;
            } else {
                serde_json::to_writer(&mut *out, outcome)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Table => table::write_outcome(out, outcome, rows)?,
    }
    Ok(())
}
