pub mod command;
pub mod device;
pub mod report;
pub mod status;

/// Build a reqwest client for talking to the daemon.
pub fn api_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Map common reqwest errors to user-friendly messages.
pub fn friendly_error(err: reqwest::Error) -> anyhow::Error {
    if err.is_connect() {
        anyhow::anyhow!(
            "Could not connect to the gdoor bridge. Is it running?\n  \
             (hint: start it with `gd-daemon` or check --api-url)"
        )
    } else if err.is_timeout() {
        anyhow::anyhow!("Request timed out. The bridge may be overloaded.")
    } else {
        anyhow::anyhow!("API request failed: {err}")
    }
}

/// The `message` of a `{result, message}` envelope, if present.
pub fn envelope_message(body: &serde_json::Value) -> &str {
    body["message"].as_str().unwrap_or("unknown error")
}
