pub mod json;

use clap::ValueEnum;
use colored::Colorize;
use genstudio_core::{AuditEntry, AuditStatus};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Print the audit trail of a call to stderr, one line per entry.
pub fn print_attempts(entries: &[AuditEntry]) {
    for entry in entries {
        let marker = match entry.status {
            AuditStatus::Success => "ok".green().bold(),
            AuditStatus::Error => "error".red().bold(),
        };
        match &entry.error_detail {
            Some(detail) => eprintln!(
                "[{marker}] {} {}: {}",
                entry.description,
                entry.redacted_detail.dimmed(),
                detail
            ),
            None => eprintln!(
                "[{marker}] {} {}",
                entry.description,
                entry.redacted_detail.dimmed()
            ),
        }
    }
}
