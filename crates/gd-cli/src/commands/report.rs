use gd_api_types::{StatusUpdatePayload, RESULT_OK};

use super::{api_client, envelope_message, friendly_error};

/// Post a status report the way a device does, for testing a deployment
/// end to end.
pub async fn run(
    api_url: &str,
    id: &str,
    status: &str,
    forwarded_for: Option<&str>,
) -> anyhow::Result<()> {
    let payload = StatusUpdatePayload::from_device(id, status);
    let mut req = api_client()
        .post(format!("{api_url}/doorStatusUpdate"))
        .header(reqwest::header::CONTENT_TYPE, "text/plain")
        .body(serde_json::to_string(&payload)?);
    if let Some(addr) = forwarded_for {
        req = req.header("X-Forwarded-For", addr);
    }
    let resp = req.send().await.map_err(friendly_error)?;

    let http_status = resp.status();
    let body: serde_json::Value = resp.json().await.map_err(friendly_error)?;
    if !http_status.is_success() || body["result"] != RESULT_OK {
        anyhow::bail!("Report rejected: {} (HTTP {http_status})", envelope_message(&body));
    }

    println!("{}", envelope_message(&body));
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

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
    async fn posts_firmware_shaped_payload() {
        let app = Router::new().route(
            "/doorStatusUpdate",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(headers["x-forwarded-for"], "203.0.113.7");
                let body: Value = serde_json::from_str(&body).unwrap();
                assert_eq!(body["statusUpdate"], "1");
                assert_eq!(body["uid"], "2XsXatJ4DgdltTMcIcrC146aUNZ2");
                Json(json!({"result": "OK", "message": "Updated door status successfully"}))
            }),
        );
        let base = serve(app).await;
        let result = run(&base, "2XsXatJ4DgdltTMcIcrC146aUNZ2", "1", Some("203.0.113.7")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn surfaces_rejection() {
        let app = Router::new().route(
            "/doorStatusUpdate",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"result": "ERROR", "message": "invalid credentials"})),
                )
            }),
        );
        let base = serve(app).await;
        let err = run(&base, "short", "1", None).await.unwrap_err();
        assert!(err.to_string().contains("invalid credentials"));
    }
}
