//! HTTP client for a remote OCR service.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::{OcrEngine, OcrError, require_text};

/// Posts raw document bytes to `{base_url}/api/ocr`.
pub struct HttpOcrClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OcrResponse {
    text: String,
}

impl HttpOcrClient {
    /// `base_url` like `http://localhost:8884`; a trailing slash is dropped.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/ocr", self.base_url)
    }
}

fn parse_response(body: &str) -> Result<String, OcrError> {
    let parsed: OcrResponse = serde_json::from_str(body)?;
    require_text(parsed.text)
}

#[async_trait]
impl OcrEngine for HttpOcrClient {
    async fn recognize(&self, image: &[u8], mime: &str) -> Result<String, OcrError> {
        let url = self.endpoint();
        info!(url = %url, bytes = image.len(), mime, "sending document to OCR service");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(image.to_vec())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OcrError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let text = parse_response(&body)?;
        info!(chars = text.len(), "OCR complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a random local port.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            // Read headers, then the declared body.
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .and_then(|v| v.trim().parse::<usize>().ok())
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/")
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = HttpOcrClient::new("http://localhost:8884/".into());
        assert_eq!(client.endpoint(), "http://localhost:8884/api/ocr");
    }

    #[test]
    fn parses_text_field() {
        assert_eq!(
            parse_response(r#"{"text":"Facility Fee $847.00"}"#).unwrap(),
            "Facility Fee $847.00"
        );
        assert!(matches!(
            parse_response(r#"{"text":"   "}"#),
            Err(OcrError::Unreadable)
        ));
        assert!(matches!(parse_response("not json"), Err(OcrError::Json(_))));
    }

    #[tokio::test]
    async fn recognize_round_trip() {
        let url = serve_once("200 OK", r#"{"text":"Pharmacy $12.50"}"#).await;
        let client = HttpOcrClient::new(url);
        let text = client.recognize(b"%PDF-1.4", "application/pdf").await.unwrap();
        assert_eq!(text, "Pharmacy $12.50");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let url = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let client = HttpOcrClient::new(url);
        let err = client.recognize(b"img", "image/png").await.unwrap_err();
        match err {
            OcrError::Server { status, body } => {
                assert_eq!(status, 503);
                assert!(body.contains("busy"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
