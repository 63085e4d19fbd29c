use std::fmt::Write as _;
use std::path::Path;

use appfleet_state::{AccountStatus, AccountView};

pub async fn status(config: &Path, format: &str) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let deployer = super::deployer(&settings)?;

    let report = deployer.refresh().await;
    let snapshot = deployer.snapshot().await;
    let accounts = snapshot.view();

    match format {
        "json" => {
            let out = serde_json::json!({ "refresh": report, "accounts": accounts });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            print!("{}", format_accounts(&accounts));
            if report.quota_mismatches > 0 {
                println!("! {} quota line item(s) matched no app", report.quota_mismatches);
            }
        }
    }

    Ok(())
}

fn format_accounts(accounts: &[AccountView<'_>]) -> String {
    let mut out = String::new();
    if accounts.is_empty() {
        out.push_str("No accounts found. Set HEROKU_TOKEN_<name> variables.\n");
        return out;
    }

    for account in accounts {
        match account.status {
            AccountStatus::Ready => {
                let _ = writeln!(
                    out,
                    "{}  quota {}/{} ({} left)  apps {}",
                    account.name,
                    account.quota_used,
                    account.quota_total,
                    account.quota_remaining,
                    account.apps.len()
                );
            }
            AccountStatus::Unavailable { reason } => {
                let _ = writeln!(out, "{}  unavailable: {}", account.name, reason);
            }
        }
        for app in &account.apps {
            let _ = writeln!(
                out,
                "  {:<30} {:<12} {:<6} {}",
                app.name, app.stack, app.region, app.quota_used
            );
        }
    }
    out
}
