use super::{api_client, friendly_error};

/// Run the `status` subcommand: call the API and print bridge status.
pub async fn run(api_url: &str) -> anyhow::Result<()> {
    let client = api_client();

    let resp = client
        .get(format!("{api_url}/api/status"))
        .send()
        .await
        .map_err(friendly_error)?;
    if !resp.status().is_success() {
        anyhow::bail!("Failed to fetch status (HTTP {})", resp.status());
    }
    let status: serde_json::Value = resp.json().await.map_err(friendly_error)?;

    let version = status["version"].as_str().unwrap_or("unknown");
    let uptime = status["uptime_seconds"].as_u64().unwrap_or(0);
    let devices = status["device_count"].as_u64().unwrap_or(0);

    println!("gdoor bridge status  (v{version})");
    println!("{}", "-".repeat(40));
    println!("Uptime:         {uptime}s");
    println!("Known devices:  {devices}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn status_displays_bridge_info() {
        let app = Router::new().route(
            "/api/status",
            get(|| async {
                Json(json!({"version": "0.1.0", "uptime_seconds": 42, "device_count": 3}))
            }),
        );
        assert!(run(&serve(app).await).await.is_ok());
    }

    #[tokio::test]
    async fn status_fails_on_api_error() {
        let app = Router::new().route(
            "/api/status",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "") }),
        );
        assert!(run(&serve(app).await).await.is_err());
    }

    #[tokio::test]
    async fn status_reports_unreachable_daemon() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = run(&format!("http://{addr}")).await.unwrap_err();
        assert!(err.to_string().contains("Could not connect"));
    }
}
