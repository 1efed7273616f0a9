use gd_core::types::{DoorPosition, DoorState};

use super::{api_client, envelope_message, friendly_error};

/// Print the stored record for one device.
pub async fn run(api_url: &str, id: &str) -> anyhow::Result<()> {
    let resp = api_client()
        .get(format!("{api_url}/api/devices/{id}"))
        .send()
        .await
        .map_err(friendly_error)?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.map_err(friendly_error)?;
    if !status.is_success() {
        anyhow::bail!("Failed to fetch device {id}: {} (HTTP {status})", envelope_message(&body));
    }

    println!("Device {id}");
    match body["doorState"].as_u64() {
        Some(state) => println!("  door state:   {}", describe_state(state)),
        None => println!("  door state:   (never reported)"),
    }
    println!(
        "  address:      {}",
        body["remoteIPAddress"].as_str().unwrap_or("(unknown)")
    );
    if let Some(ts) = body["lastIPUpdate"].as_i64() {
        println!("  last seen:    {ts} ms since epoch");
    }

    Ok(())
}

/// `1 (closed)` for codes the firmware defines, the bare code otherwise.
fn describe_state(code: u64) -> String {
    let position = u8::try_from(code)
        .ok()
        .and_then(|c| DoorState::new(c).ok())
        .and_then(DoorState::position);
    match position {
        Some(DoorPosition::Open) => format!("{code} (open)"),
        Some(DoorPosition::Closed) => format!("{code} (closed)"),
        None => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path as AxPath, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn prints_known_device() {
        let app = Router::new().route(
            "/api/devices/{id}",
            get(|AxPath(id): AxPath<String>| async move {
                Json(json!({
                    "id": id,
                    "doorState": 1,
                    "remoteIPAddress": "203.0.113.7",
                    "lastIPUpdate": 1700000000000i64
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        assert!(run(&format!("http://{addr}"), "2XsXatJ4DgdltTMcIcrC146aUNZ2").await.is_ok());
    }

    #[tokio::test]
    async fn surfaces_not_found_message() {
        let app = Router::new().route(
            "/api/devices/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"result": "ERROR", "message": "unknown device"})),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let err = run(&format!("http://{addr}"), "2XsXatJ4DgdltTMcIcrC146aUNZ2")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown device"));
    }

    #[test]
    fn describes_known_positions() {
        assert_eq!(describe_state(0), "0 (open)");
        assert_eq!(describe_state(1), "1 (closed)");
        assert_eq!(describe_state(42), "42");
        assert_eq!(describe_state(300), "300");
    }
}
