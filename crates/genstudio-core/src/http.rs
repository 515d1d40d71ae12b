use reqwest::Client;

use crate::config::RequesterConfig;

const DISABLE_SYSTEM_PROXY_ENV: &str = "GENSTUDIO_DISABLE_SYSTEM_PROXY";

/// Build the HTTP client shared by the requester and the shared-pool fetcher.
pub fn build_http_client(config: &RequesterConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .user_agent(config.user_agent.clone());

    if should_disable_system_proxy() {
        builder = builder.no_proxy();
    }

    builder.build()
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
