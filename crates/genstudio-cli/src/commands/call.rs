use anyhow::{Context, Result};
use colored::Colorize;
use genstudio_core::{NotificationEvent, redact};
use serde_json::{Value, json};

use crate::cli::CallArgs;
use crate::config::CliConfig;
use crate::output::{OutputFormat, json::print_json, print_attempts};
use crate::setup::prepare_session;

pub async fn run(config: &CliConfig, args: CallArgs, format: OutputFormat) -> Result<()> {
    let payload = read_payload(&args)?;
    let session = prepare_session(config)?;
    let mut events = session.bus.subscribe();

    let result = session
        .requester
        .execute(&args.endpoint, &payload, &args.context, args.token.as_deref())
        .await;

    if args.show_attempts {
        print_attempts(&session.audit.entries());
    }

    while let Ok(event) = events.try_recv() {
        if event == NotificationEvent::PersonalTokenFailed {
            eprintln!(
                "{} your personal token was rejected. Replace it with:\n  {} genstudio auth set-personal <TOKEN>",
                "Warning:".yellow().bold(),
                "$".dimmed()
            );
        }
    }

    let response = result?;
    let used = redact(&response.used_credential, config.http.redact_suffix_len);

    if format.is_json() {
        return print_json(&json!({
            "data": response.data,
            "used_credential": used,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&response.data)?);
    eprintln!("{} {}", "Credential:".dimmed(), used);
    Ok(())
}

fn read_payload(args: &CallArgs) -> Result<Value> {
    let raw = match (&args.payload, &args.payload_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file {}", path.display()))?,
        (None, None) => return Ok(json!({})),
    };
    serde_json::from_str(&raw).context("Payload is not valid JSON")
}
