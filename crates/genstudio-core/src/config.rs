//! Request layer configuration

use crate::credential::DEFAULT_REDACT_SUFFIX_LEN;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the rotating requester and its HTTP transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterConfig {
    /// Total time allowed for one request/response pair
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Time allowed to establish a connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Trailing token characters shown in logs and audit entries
    #[serde(default = "default_redact_suffix_len")]
    pub redact_suffix_len: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Generation endpoints can take minutes to answer.
fn default_request_timeout() -> u64 {
    120
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_redact_suffix_len() -> usize {
    DEFAULT_REDACT_SUFFIX_LEN
}
fn default_user_agent() -> String {
    format!("genstudio/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            redact_suffix_len: default_redact_suffix_len(),
            user_agent: default_user_agent(),
        }
    }
}

impl RequesterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
