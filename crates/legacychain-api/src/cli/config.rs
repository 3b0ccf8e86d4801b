//! `legacychain config`: print the effective configuration.

use std::path::Path;

use anyhow::Result;
use console::style;
use serde_json::{Value, json};

use legacychain_types::config::AppConfig;

const REDACTED: &str = "[REDACTED]";

/// The effective configuration as JSON. The signing secret is reported only
/// as present or absent.
pub fn effective_config(data_dir: &Path, config: &AppConfig) -> Value {
    json!({
        "data_dir": data_dir.display().to_string(),
        "server": config.server,
        "ledger": {
            "backend": config.ledger.backend,
            "network": config.ledger.network,
            "passphrase": config.ledger.network.passphrase(),
            "rpc_url": config.ledger.resolved_rpc_url(),
            "signing_secret": config.ledger.signing_secret.as_ref().map(|_| REDACTED),
            "contracts": config.ledger.contracts,
        },
        "content": config.content,
        "retry": config.retry,
        "countdown": config.countdown,
    })
}

pub fn show_config(data_dir: &Path, config: &AppConfig, json: bool) -> Result<()> {
    let effective = effective_config(data_dir, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&effective)?);
        return Ok(());
    }

    println!();
    print_section("", &effective);
    println!();
    Ok(())
}

fn print_section(prefix: &str, value: &Value) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(_) => print_section(&path, value),
            Value::Null => println!("  {} {}", style(format!("{path}:")).bold(), style("(unset)").dim()),
            Value::String(s) => println!("  {} {s}", style(format!("{path}:")).bold()),
            other => println!("  {} {other}", style(format!("{path}:")).bold()),
        }
    }
}
