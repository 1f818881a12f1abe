// SPDX-License-Identifier: MIT OR Apache-2.0
//! Client side of the remote encoder protocol.

use crate::error::NetworkError;
use crate::protocol::{
    endpoints, frame_file_name, AckResponse, ErrorBody, FinishResponse, SessionId, StartResponse,
    StatusReport,
};
use crate::settings::{ExportConfig, ExportSettings};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Remote encoder session operations
#[async_trait]
pub trait EncoderClient: Send + Sync {
    /// Create a session and its storage
    async fn start(&self, settings: &ExportSettings) -> Result<SessionId, NetworkError>;

    /// Store one encoded frame under its index
    async fn upload_frame(
        &self,
        session: &SessionId,
        index: u32,
        png: Vec<u8>,
    ) -> Result<(), NetworkError>;

    /// Start encoding and return the locator of the finished video
    async fn finish(&self, session: &SessionId) -> Result<String, NetworkError>;

    /// Stop any encode and discard the session's storage
    async fn cancel(&self, session: &SessionId) -> Result<(), NetworkError>;

    /// Poll session progress
    async fn status(&self, session: &SessionId) -> Result<StatusReport, NetworkError>;
}

/// HTTP implementation of [`EncoderClient`]
#[derive(Debug, Clone)]
pub struct HttpEncoderClient {
    client: Client,
    base_url: String,
}

impl HttpEncoderClient {
    /// Client for the encoder at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| NetworkError::Transport {
                endpoint: "client".to_string(),
                source,
            })?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an already configured `reqwest` client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client configured from an [`ExportConfig`]
    pub fn from_config(config: &ExportConfig) -> Result<Self, NetworkError> {
        Self::new(config.server_url.clone(), config.request_timeout())
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NetworkError> {
        let transport = |source| NetworkError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            tracing::warn!(endpoint, status = status.as_u16(), %message, "Encoder request failed");
            return Err(NetworkError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(transport)
    }

    fn expect_ok(endpoint: &str, ok: bool) -> Result<(), NetworkError> {
        if ok {
            Ok(())
        } else {
            Err(NetworkError::Malformed {
                endpoint: endpoint.to_string(),
                reason: "server did not acknowledge".to_string(),
            })
        }
    }
}

#[async_trait]
impl EncoderClient for HttpEncoderClient {
    async fn start(&self, settings: &ExportSettings) -> Result<SessionId, NetworkError> {
        let endpoint = endpoints::START;
        let request = self.client.post(self.url(endpoint)).json(settings);
        let response: StartResponse = self.send(endpoint, request).await?;
        if response.id.is_empty() {
            return Err(NetworkError::Malformed {
                endpoint: endpoint.to_string(),
                reason: "empty session id".to_string(),
            });
        }
        tracing::info!(session = %response.id, frames = settings.render.frame_count, "Export session started");
        Ok(SessionId(response.id))
    }

    async fn upload_frame(
        &self,
        session: &SessionId,
        index: u32,
        png: Vec<u8>,
    ) -> Result<(), NetworkError> {
        let endpoint = endpoints::frame(session);
        let part = Part::bytes(png)
            .file_name(frame_file_name(index))
            .mime_str("image/png")
            .map_err(|source| NetworkError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        let form = Form::new().text("index", index.to_string()).part("frame", part);

        let request = self.client.post(self.url(&endpoint)).multipart(form);
        let response: AckResponse = self.send(&endpoint, request).await?;
        Self::expect_ok(&endpoint, response.ok)
    }

    async fn finish(&self, session: &SessionId) -> Result<String, NetworkError> {
        let endpoint = endpoints::finish(session);
        let request = self.client.post(self.url(&endpoint));
        let response: FinishResponse = self.send(&endpoint, request).await?;
        Self::expect_ok(&endpoint, response.ok)?;
        Ok(self.url(&response.output))
    }

    async fn cancel(&self, session: &SessionId) -> Result<(), NetworkError> {
        let endpoint = endpoints::cancel(session);
        let request = self.client.post(self.url(&endpoint));
        let response: AckResponse = self.send(&endpoint, request).await?;
        tracing::info!(%session, "Export session cancelled");
        Self::expect_ok(&endpoint, response.ok)
    }

    async fn status(&self, session: &SessionId) -> Result<StatusReport, NetworkError> {
        let endpoint = endpoints::status(session);
        let request = self.client.get(self.url(&endpoint));
        self.send(&endpoint, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SessionStatus;
    use splatpath_sequencer::{CameraPose, Keyframe};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// One request as received by [`serve`]
    struct Captured {
        method: String,
        path: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Answer one connection per canned `(status, body)` reply, in order
    async fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 {status} Reply\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            seen
        });
        (base, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers ended");
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap().split(' ');
        let method = request_line.next().unwrap().to_string();
        let path = request_line.next().unwrap().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = buf[head_end..].to_vec();
        while body.len() < length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            body.extend_from_slice(&chunk[..n]);
        }

        Captured {
            method,
            path,
            headers,
            body,
        }
    }

    fn client(base: &str) -> HttpEncoderClient {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpEncoderClient::with_client(client, base)
    }

    fn settings() -> ExportSettings {
        let keyframes = vec![
            Keyframe::new(0.0, CameraPose::at([0.0, 0.0, 0.0])),
            Keyframe::new(2.0, CameraPose::at([1.0, 0.0, 0.0])),
        ];
        let config = ExportConfig {
            width: 64,
            height: 32,
            fps: 10,
            ..Default::default()
        };
        ExportSettings::new("scene.ply", keyframes, &config)
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = HttpEncoderClient::new("http://localhost:5174/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5174");
        assert_eq!(
            client.url("/exports/abc/output.mp4"),
            "http://localhost:5174/exports/abc/output.mp4"
        );
    }

    #[tokio::test]
    async fn test_session_requests_on_the_wire() {
        let (base, server) = serve(vec![
            (200, r#"{"id":"abc"}"#),
            (200, r#"{"ok":true}"#),
            (200, r#"{"ok":true,"output":"/exports/abc/output.mp4"}"#),
            (200, r#"{"status":"encoding","receivedFrames":20,"totalFrames":20}"#),
        ])
        .await;
        let client = client(&format!("{base}/"));
        let png = b"\x89PNG\r\n\x1a\nfake".to_vec();

        let session = client.start(&settings()).await.unwrap();
        assert_eq!(session, SessionId::from("abc"));
        client.upload_frame(&session, 7, png.clone()).await.unwrap();
        let locator = client.finish(&session).await.unwrap();
        assert_eq!(locator, format!("{base}/exports/abc/output.mp4"));
        let report = client.status(&session).await.unwrap();
        assert_eq!(report.status, SessionStatus::Encoding);
        assert_eq!(report.received_frames, 20);

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 4);

        let start = &seen[0];
        assert_eq!((start.method.as_str(), start.path.as_str()), ("POST", "/export/start"));
        assert!(start.header("content-type").unwrap().starts_with("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&start.body).unwrap();
        assert_eq!(body["sceneUrl"], "scene.ply");
        assert_eq!(body["render"]["frameCount"], 20);
        assert_eq!(body["keyframes"].as_array().map(Vec::len), Some(2));

        let frame = &seen[1];
        assert_eq!((frame.method.as_str(), frame.path.as_str()), ("POST", "/export/abc/frame"));
        assert!(frame
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        let text = frame.body_text();
        assert!(text.contains("name=\"index\"\r\n\r\n7\r\n"));
        assert!(text.contains("name=\"frame\"; filename=\"frame_000007.png\""));
        assert!(text.contains("image/png"));
        assert!(frame.body.windows(png.len()).any(|w| w == png.as_slice()));

        assert_eq!((seen[2].method.as_str(), seen[2].path.as_str()), ("POST", "/export/abc/finish"));
        assert_eq!((seen[3].method.as_str(), seen[3].path.as_str()), ("GET", "/export/abc/status"));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let (base, server) = serve(vec![
            (404, r#"{"error":"unknown session"}"#),
            (500, "encoder crashed"),
        ])
        .await;
        let client = client(&base);
        let session = SessionId::from("gone");

        let err = client.status(&session).await.unwrap_err();
        match err {
            NetworkError::Status {
                endpoint,
                status,
                message,
            } => {
                assert_eq!(endpoint, "/export/gone/status");
                assert_eq!(status, 404);
                assert_eq!(message, "unknown session");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = client.cancel(&session).await.unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Status { status: 500, ref message, .. } if message == "encoder crashed"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unacknowledged_reply_is_malformed() {
        let (base, server) = serve(vec![(200, r#"{"ok":false}"#), (200, r#"{"id":""}"#)]).await;
        let client = client(&base);

        let err = client.cancel(&SessionId::from("abc")).await.unwrap_err();
        assert!(matches!(err, NetworkError::Malformed { ref endpoint, .. } if endpoint == "/export/abc/cancel"));

        let err = client.start(&settings()).await.unwrap_err();
        assert!(matches!(err, NetworkError::Malformed { .. }));
        server.await.unwrap();
    }
}
