//! Audit history CLI command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use legacychain_types::history::{HistoryEntry, HistoryKind};

use crate::state::AppState;

/// List one will's history (oldest first) or the latest entries overall.
pub async fn show_history(
    state: &AppState,
    owner: Option<&str>,
    limit: u32,
    json: bool,
) -> Result<()> {
    let entries = match owner {
        Some(owner) => state.will_service.history(owner).await?,
        None => state.will_service.recent_history(limit).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("  {}", style("No history yet.").dim());
        return Ok(());
    }

    println!("{}", history_table(&entries));
    println!("  {} entries", entries.len());
    Ok(())
}

fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Will").fg(Color::White),
        Cell::new("Tx").fg(Color::White),
        Cell::new("Amount").fg(Color::White),
        Cell::new("Recipients").fg(Color::White),
    ]);

    for entry in entries {
        let kind_color = match entry.kind {
            HistoryKind::Create => Color::Yellow,
            HistoryKind::Execute => Color::Green,
        };
        table.add_row(vec![
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(entry.kind).fg(kind_color),
            Cell::new(&entry.will_id).fg(Color::Cyan),
            Cell::new(&entry.tx_id).fg(Color::DarkGrey),
            Cell::new(entry.amount),
            Cell::new(entry.recipients.len()),
        ]);
    }
    table
}
