//! Will CLI commands: show, execute.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use legacychain_core::service::will::ExecuteOutcome;
use legacychain_types::unlock::UnlockState;
use legacychain_types::will::WillStatus;

use crate::state::AppState;

fn format_status(status: WillStatus) -> String {
    match status {
        WillStatus::Draft => format!("{}", style("draft").dim()),
        WillStatus::Locked => format!("{}", style("locked").yellow()),
        WillStatus::Unlockable => format!("{}", style("unlockable").cyan()),
        WillStatus::Executed => format!("{}", style("executed").green()),
        WillStatus::Failed => format!("{}", style("failed").red()),
    }
}

/// Print a will's registry record, gate verdict and disbursement plan.
pub async fn show_will(state: &AppState, owner: &str, json: bool) -> Result<()> {
    let view = state.will_service.get_will(owner).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let record = &view.record;
    let unlock = match view.gate {
        UnlockState::Locked { remaining } => format!("{} ({remaining} remaining)", record.unlock_timestamp),
        UnlockState::Unlockable => format!("{} (reached)", record.unlock_timestamp),
    };

    println!();
    println!("  {} {}", style("Will of").bold(), style(&record.owner).cyan());
    println!();
    println!("  {}", style("── Details ──").dim());
    println!("  {}       {}", style("Status:").bold(), format_status(view.status));
    println!("  {}      {}", style("Unlocks:").bold(), unlock);
    println!("  {}       {}", style("Amount:").bold(), record.amount);
    println!("  {}      {}", style("Payload:").bold(), record.payload_reference);
    println!("  {}   {}", style("Created tx:").bold(), record.created_tx_id);
    println!(
        "  {}  {}",
        style("Executed tx:").bold(),
        record.executed_tx_id.as_deref().unwrap_or("-")
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Beneficiary").fg(Color::White),
        Cell::new("Share").fg(Color::White),
        Cell::new("Disbursement").fg(Color::White),
    ]);
    for (beneficiary, payout) in record.beneficiaries.iter().zip(record.disbursement_plan()) {
        table.add_row(vec![
            Cell::new(&beneficiary.address).fg(Color::Cyan),
            Cell::new(beneficiary.share),
            Cell::new(payout.amount),
        ]);
    }
    println!("{table}");
    println!();

    Ok(())
}

/// Execute a will and report the transaction id.
pub async fn execute_will(state: &AppState, owner: &str, json: bool) -> Result<()> {
    let outcome = state.will_service.execute_will(owner).await?;
    let already = matches!(outcome, ExecuteOutcome::AlreadyExecuted { .. });

    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "txId": outcome.tx_id(), "alreadyExecuted": already })
        );
    } else if already {
        println!(
            "  {} Will was already executed (tx {})",
            style("•").yellow().bold(),
            style(outcome.tx_id()).dim()
        );
    } else {
        println!(
            "  {} Will executed (tx {})",
            style("✓").green().bold(),
            style(outcome.tx_id()).cyan()
        );
    }

    Ok(())
}
