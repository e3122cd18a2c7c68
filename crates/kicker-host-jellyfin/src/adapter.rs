//! Jellyfin HTTP adapter implementation

use async_trait::async_trait;
use kicker_api::{PlayStateCommand, Session};
use kicker_host_api::{HostError, HostResult, MediaServer};
use kicker_util::{DeviceId, ItemId, SessionId};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const AUTH_HEADER: &str = "X-Emby-Authorization";
const CLIENT_NAME: &str = "Session Kicker";
const MESSAGE_HEADER: &str = "Session Kicker";
const MESSAGE_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for a Jellyfin server
#[derive(Debug, Clone)]
pub struct JellyfinConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:8096`
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessageBody<'a> {
    header: &'a str,
    text: &'a str,
    timeout_ms: u64,
}

/// `MediaServer` backed by the Jellyfin REST API
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    auth: String,
}

impl JellyfinClient {
    pub fn new(config: JellyfinConfig) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| HostError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: auth_header_value(&config.api_key),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTH_HEADER, &self.auth)
    }

    async fn execute(&self, builder: RequestBuilder, endpoint: &str) -> HostResult<()> {
        let response = builder
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(endpoint, status = status.as_u16(), "Command accepted");
        Ok(())
    }

    /// Fetch active sessions, surfacing every failure
    pub async fn try_list_sessions(&self) -> HostResult<Vec<Session>> {
        let response = self
            .request(Method::GET, "/Sessions")
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HostError::Status {
                endpoint: "/Sessions".into(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| HostError::InvalidResponse(e.to_string()))?;

        Ok(parse_sessions(entries))
    }
}

/// Decode each session on its own so one malformed entry doesn't hide the rest
fn parse_sessions(entries: Vec<serde_json::Value>) -> Vec<Session> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed session entry");
                None
            }
        })
        .collect()
}

fn auth_header_value(api_key: &str) -> String {
    format!(
        "MediaBrowser Client=\"{}\", Device=\"reqwest\", DeviceId=\"session-kicker\", Version=\"{}\", Token=\"{}\"",
        CLIENT_NAME,
        env!("CARGO_PKG_VERSION"),
        api_key
    )
}

#[async_trait]
impl MediaServer for JellyfinClient {
    async fn list_sessions(&self) -> Vec<Session> {
        match self.try_list_sessions().await {
            Ok(sessions) => sessions,
            Err(HostError::InvalidResponse(e)) => {
                warn!(
                    error = %e,
                    "Server didn't respond with JSON; the API key or server URL is most likely incorrect"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch sessions");
                Vec::new()
            }
        }
    }

    async fn delete_device(&self, device_id: &DeviceId) -> HostResult<()> {
        let builder = self
            .request(Method::DELETE, "/Devices")
            .query(&[("id", device_id.as_str())]);
        self.execute(builder, "/Devices").await
    }

    async fn send_message(&self, session_id: &SessionId, text: &str) -> HostResult<()> {
        let path = format!("/Sessions/{}/Message", session_id);
        let builder = self.request(Method::POST, &path).json(&MessageBody {
            header: MESSAGE_HEADER,
            text,
            timeout_ms: MESSAGE_TIMEOUT_MS,
        });
        self.execute(builder, &path).await
    }

    async fn set_play_state(
        &self,
        session_id: &SessionId,
        command: PlayStateCommand,
    ) -> HostResult<()> {
        let path = format!("/Sessions/{}/Playing/{}", session_id, command.as_str());
        let builder = self.request(Method::POST, &path);
        self.execute(builder, &path).await
    }

    async fn stop_encoding(&self, session_id: &SessionId, device_id: &DeviceId) -> HostResult<()> {
        let builder = self
            .request(Method::DELETE, "/Videos/ActiveEncodings")
            .query(&[
                ("deviceId", device_id.as_str()),
                ("playSessionId", session_id.as_str()),
            ]);
        self.execute(builder, "/Videos/ActiveEncodings").await
    }

    async fn play_item(&self, session_id: &SessionId, item_id: &ItemId) -> HostResult<()> {
        let path = format!("/Sessions/{}/Playing", session_id);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("playCommand", "PlayNow"), ("itemIds", item_id.as_str())]);
        self.execute(builder, &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const SESSIONS_JSON: &str = r#"[
        {
            "Id": "s-1",
            "UserId": "u-kid",
            "DeviceId": "d-tv",
            "NowPlayingItem": { "Id": "i-1", "Type": "Movie" },
            "PlayState": { "IsPaused": false },
            "SupportedCommands": ["DisplayMessage"],
            "SupportsMediaControl": true
        },
        { "Id": "s-2" }
    ]"#;

    /// Serve a single canned HTTP response; the raw request is sent back
    /// through the returned channel.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            let _ = tx.send(request);
        });

        (format!("http://{}", addr), rx)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    fn client(base_url: String) -> JellyfinClient {
        JellyfinClient::new(JellyfinConfig {
            base_url,
            api_key: "secret".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lists_sessions_with_auth_header() {
        let (url, request) = serve_once("200 OK", SESSIONS_JSON).await;

        let sessions = client(url).list_sessions().await;

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id.as_str(), "s-1");
        assert!(sessions[1].now_playing_item.is_none());

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /Sessions HTTP/1.1"));
        let lower = request.to_lowercase();
        assert!(lower.contains("x-emby-authorization: mediabrowser"));
        assert!(request.contains("Token=\"secret\""));
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_hide_others() {
        let body = r#"[
            { "Id": "s-ok", "UserId": "u-kid", "NowPlayingItem": { "Id": "i-1", "Type": "Movie" } },
            { "Id": 42, "NowPlayingItem": "not an object" },
            { "Id": "s-nulls", "PlayState": null, "SupportedCommands": null }
        ]"#;
        let (url, _request) = serve_once("200 OK", body).await;

        let sessions = client(url).try_list_sessions().await.unwrap();

        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-ok", "s-nulls"]);
    }

    #[test]
    fn test_parse_sessions_skips_bad_entries() {
        let entries = vec![
            serde_json::json!({ "Id": "s-1" }),
            serde_json::json!("garbage"),
            serde_json::json!({ "UserId": "no-session-id" }),
        ];

        let sessions = parse_sessions(entries);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id.as_str(), "s-1");
    }

    #[tokio::test]
    async fn test_server_error_yields_no_sessions() {
        let (url, _request) = serve_once("500 Internal Server Error", "{}").await;

        assert!(client(url).list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported_by_try_list() {
        let (url, _request) = serve_once("500 Internal Server Error", "{}").await;

        let err = client(url).try_list_sessions().await.unwrap_err();
        assert!(matches!(err, HostError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_yields_no_sessions() {
        let (url, _request) = serve_once("200 OK", "<html>login</html>").await;
        assert!(client(url).list_sessions().await.is_empty());

        let (url, _request) = serve_once("200 OK", "<html>login</html>").await;
        let err = client(url).try_list_sessions().await.unwrap_err();
        assert!(matches!(err, HostError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_no_sessions() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(client(format!("http://{}", addr)).list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_posts_json_body() {
        let (url, request) = serve_once("204 No Content", "").await;

        client(url)
            .send_message(&SessionId::new("s-1"), "Time's up")
            .await
            .unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /Sessions/s-1/Message HTTP/1.1"));
        assert!(request.contains("\"Header\":\"Session Kicker\""));
        assert!(request.contains("\"Text\":\"Time's up\""));
        assert!(request.contains("\"TimeoutMs\":10000"));
    }

    #[tokio::test]
    async fn test_playstate_and_encoding_paths() {
        let (url, request) = serve_once("204 No Content", "").await;
        client(url)
            .set_play_state(&SessionId::new("s-1"), PlayStateCommand::Stop)
            .await
            .unwrap();
        assert!(
            request
                .await
                .unwrap()
                .starts_with("POST /Sessions/s-1/Playing/Stop HTTP/1.1")
        );

        let (url, request) = serve_once("204 No Content", "").await;
        client(url)
            .stop_encoding(&SessionId::new("s-1"), &DeviceId::new("d-tv"))
            .await
            .unwrap();
        assert!(
            request
                .await
                .unwrap()
                .starts_with("DELETE /Videos/ActiveEncodings?deviceId=d-tv&playSessionId=s-1 HTTP/1.1")
        );
    }

    #[tokio::test]
    async fn test_delete_device_and_play_item_paths() {
        let (url, request) = serve_once("204 No Content", "").await;
        client(url).delete_device(&DeviceId::new("d-tv")).await.unwrap();
        assert!(
            request
                .await
                .unwrap()
                .starts_with("DELETE /Devices?id=d-tv HTTP/1.1")
        );

        let (url, request) = serve_once("204 No Content", "").await;
        client(url)
            .play_item(&SessionId::new("s-1"), &ItemId::new("i-99"))
            .await
            .unwrap();
        assert!(
            request
                .await
                .unwrap()
                .starts_with("POST /Sessions/s-1/Playing?playCommand=PlayNow&itemIds=i-99 HTTP/1.1")
        );
    }

    #[tokio::test]
    async fn test_command_failure_carries_status() {
        let (url, _request) = serve_once("404 Not Found", "").await;

        let err = client(url)
            .set_play_state(&SessionId::new("gone"), PlayStateCommand::Stop)
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Status { status: 404, .. }));
    }

    #[test]
    fn test_auth_header_carries_token() {
        let value = auth_header_value("abc");
        assert!(value.starts_with("MediaBrowser Client=\"Session Kicker\""));
        assert!(value.ends_with("Token=\"abc\""));
    }
}
