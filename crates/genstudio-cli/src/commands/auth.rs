use anyhow::Result;
use colored::Colorize;
use genstudio_core::redact;
use serde_json::json;

use crate::cli::AuthCommands;
use crate::config::CliConfig;
use crate::output::{OutputFormat, json::print_json};
use crate::setup::open_profile;

pub fn run(config: &CliConfig, command: AuthCommands, format: OutputFormat) -> Result<()> {
    match command {
        AuthCommands::Show => show(config, format),
        AuthCommands::SetPersonal { token } => set_personal(config, &token, format),
        AuthCommands::ClearPersonal => clear_personal(config, format),
    }
}

fn show(config: &CliConfig, format: OutputFormat) -> Result<()> {
    let profile = open_profile(config)?;
    let suffix = config.http.redact_suffix_len;
    let personal = profile.personal_credential();
    let shared: Vec<String> = config
        .credentials
        .seeded_shared()
        .iter()
        .map(|c| c.redacted(suffix))
        .collect();

    if format.is_json() {
        return print_json(&json!({
            "profile_path": profile.path().display().to_string(),
            "personal": personal.as_ref().map(|c| c.redacted(suffix)),
            "personal_issued_at": personal.as_ref().and_then(|c| c.issued_at),
            "shared": shared,
            "shared_pool_url": config.credentials.shared_pool_url,
        }));
    }

    println!("{} {}", "Profile:".bold(), profile.path().display());
    match &personal {
        Some(credential) => println!(
            "{} {}",
            "Personal:".bold(),
            credential.redacted(suffix).green()
        ),
        None => println!("{} {}", "Personal:".bold(), "not set".dimmed()),
    }
    println!("{} {}", "Shared:".bold(), shared.len());
    for (index, value) in shared.iter().enumerate() {
        println!("  #{} {}", index + 1, value);
    }
    match &config.credentials.shared_pool_url {
        Some(url) => println!("{} {}", "Shared pool:".bold(), url),
        None => println!("{} {}", "Shared pool:".bold(), "not configured".dimmed()),
    }
    Ok(())
}

fn set_personal(config: &CliConfig, token: &str, format: OutputFormat) -> Result<()> {
    let profile = open_profile(config)?;
    profile.set_personal_token(token)?;

    let redacted = redact(token.trim(), config.http.redact_suffix_len);
    if format.is_json() {
        return print_json(&json!({ "personal": redacted, "saved": true }));
    }
    println!("Personal token {} saved", redacted.green());
    Ok(())
}

fn clear_personal(config: &CliConfig, format: OutputFormat) -> Result<()> {
    let profile = open_profile(config)?;
    profile.clear_personal_token()?;

    if format.is_json() {
        return print_json(&json!({ "personal": null, "saved": true }));
    }
    println!("Personal token cleared");
    Ok(())
}
