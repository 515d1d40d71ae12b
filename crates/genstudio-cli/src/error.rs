use colored::Colorize;
use genstudio_core::RequestError;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(request_error) = err.downcast_ref::<RequestError>() {
        match request_error {
            RequestError::NoCredentialsAvailable { .. } => {
                eprintln!("\n{}", "Suggestion:".yellow().bold());
                eprintln!("  Configure a personal token with:");
                eprintln!("  {} genstudio auth set-personal <TOKEN>", "$".dimmed());
                eprintln!("  or add shared_tokens / shared_pool_url to config.toml.");
            }
            RequestError::Network(_) => {
                eprintln!("\n{}", "Suggestion:".yellow().bold());
                eprintln!("  Check your internet connection and the endpoint URL.");
            }
            RequestError::RemoteRejection { status: 401 | 403, .. } => {
                eprintln!("\n{}", "Suggestion:".yellow().bold());
                eprintln!("  The token was rejected. Inspect the attempts with --show-attempts.");
            }
            _ => {}
        }
    }

    std::process::exit(1);
}
