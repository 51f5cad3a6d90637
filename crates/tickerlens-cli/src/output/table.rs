use std::io::{self, Write};

use tickerlens_core::snapshot::DisplayField;
use tickerlens_core::{FieldFormatter, FormatKind, QuoteSnapshot, SnapshotOutcome};

const LABEL_WIDTH: usize = 16;

pub fn write_outcome<W: Write>(out: &mut W, outcome: &SnapshotOutcome, rows: usize) -> io::Result<()> {
    match outcome {
        SnapshotOutcome::Ready(snapshot) => write_snapshot(out, snapshot, rows),
        SnapshotOutcome::NoData(no_data) => writeln!(out, "{}", no_data.message),
    }
}

fn write_snapshot<W: Write>(out: &mut W, snapshot: &QuoteSnapshot, rows: usize) -> io::Result<()> {
    let display = &snapshot.display;
    let formatter = FieldFormatter::new(display.currency_symbol.clone());

    writeln!(out, "{} - {}", snapshot.symbol, display.profile.name)?;
    writeln!(out, "{} (source: {})", snapshot.range, snapshot.provider)?;
    writeln!(out)?;

    write_fields(out, &display.headline, 0)?;

    writeln!(out)?;
    writeln!(out, "Key Statistics")?;
    write_fields(out, &display.key_statistics, 2)?;

    if !snapshot.moving_averages.is_empty() {
        writeln!(out)?;
        writeln!(out, "Moving Averages")?;
        for average in &snapshot.moving_averages {
            let value = formatter.number(average.latest(), FormatKind::Currency);
            writeln!(out, "  {:<LABEL_WIDTH$}{value}", average.label())?;
        }
    }

    let profile = &display.profile;
    writeln!(out)?;
    writeln!(out, "Company Profile")?;
    writeln!(out, "  {:<LABEL_WIDTH$}{}", "Sector", profile.sector)?;
    writeln!(out, "  {:<LABEL_WIDTH$}{}", "Industry", profile.industry)?;
    if !profile.website.is_empty() {
        writeln!(out, "  {:<LABEL_WIDTH$}{}", "Website", profile.website)?;
    }
    writeln!(out, "  {}", profile.summary)?;

    if rows > 0 {
        writeln!(out)?;
        writeln!(out, "Recent Sessions (newest first)")?;
        writeln!(
            out,
            "  {:<12}{:>12}{:>12}{:>12}{:>12}{:>16}",
            "Date", "Open", "High", "Low", "Close", "Volume"
        )?;
        for bar in snapshot.bars_newest_first().iter().take(rows) {
            writeln!(
                out,
                "  {:<12}{:>12}{:>12}{:>12}{:>12}{:>16}",
                bar.date.to_string(),
                formatter.number(Some(bar.open), FormatKind::Currency),
                formatter.number(Some(bar.high), FormatKind::Currency),
                formatter.number(Some(bar.low), FormatKind::Currency),
                formatter.number(Some(bar.close), FormatKind::Currency),
                formatter.number(Some(bar.volume as f64), FormatKind::Plain),
            )?;
        }
    }

    if !snapshot.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings")?;
        for warning in &snapshot.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    Ok(())
}

fn write_fields<W: Write>(out: &mut W, fields: &[DisplayField], indent: usize) -> io::Result<()> {
    for field in fields {
        match &field.delta {
            Some(delta) => writeln!(
                out,
                "{:indent$}{:<LABEL_WIDTH$}{}  ({delta})",
                "", field.label, field.value
            )?,
            None => writeln!(out, "{:indent$}{:<LABEL_WIDTH$}{}", "", field.label, field.value)?,
        }
    }
    Ok(())
}
