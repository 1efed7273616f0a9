use gd_api_types::CommandBody;
use gd_core::types::{DeviceId, DoorCommand};

use super::{api_client, envelope_message, friendly_error};

/// Ask the bridge to send `command` to device `id` and wait for the
/// device's acknowledgement.
pub async fn run(
    api_url: &str,
    id: &str,
    command: &str,
    address: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let id = DeviceId::parse(id)?;
    let command: DoorCommand = command.parse()?;

    let body = CommandBody {
        command: command.name().to_string(),
        address,
        port,
    };
    let resp = api_client()
        .post(format!("{api_url}/api/devices/{id}/commands"))
        .json(&body)
        .send()
        .await
        .map_err(friendly_error)?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.map_err(friendly_error)?;
    if !status.is_success() {
        anyhow::bail!("{command} failed for {id}: {} (HTTP {status})", envelope_message(&body));
    }

    println!("{}", envelope_message(&body));
    if let Some(url) = body["url"].as_str() {
        println!("  url: {url}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path as AxPath, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;

    const UID: &str = "2XsXatJ4DgdltTMcIcrC146aUNZ2";

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn sends_normalized_command() {
        let app = Router::new().route(
            "/api/devices/{id}/commands",
            post(|AxPath(id): AxPath<String>, Json(body): Json<Value>| async move {
                assert_eq!(id, UID);
                assert_eq!(body["command"], "actuate-door");
                assert_eq!(body["port"], 8080);
                assert!(body.get("address").is_none());
                Json(json!({
                    "result": "OK",
                    "message": "actuate-door acknowledged by device",
                    "url": format!("http://10.0.0.2:8080/{id}//ActuateDoor")
                }))
            }),
        );
        let base = serve(app).await;
        assert!(run(&base, UID, "ActuateDoor", None, Some(8080)).await.is_ok());
    }

    #[tokio::test]
    async fn surfaces_dispatch_failure() {
        let app = Router::new().route(
            "/api/devices/{id}/commands",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"result": "ERROR", "message": "device unreachable"})),
                )
            }),
        );
        let base = serve(app).await;
        let err = run(&base, UID, "health-check", Some("10.0.0.2".into()), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("device unreachable"));
    }

    #[tokio::test]
    async fn rejects_unknown_command_locally() {
        // No server needed: validation happens before any request.
        let err = run("http://127.0.0.1:1", UID, "open-sesame", None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("open-sesame"));
    }

    #[tokio::test]
    async fn rejects_bad_device_id_locally() {
        assert!(run("http://127.0.0.1:1", "short", "health-check", None, None)
            .await
            .is_err());
    }
}
