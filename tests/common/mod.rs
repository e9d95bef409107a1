//! Shared helpers: an in-process mock of the conversion service.

#![allow(dead_code)]

use axum::extract::Multipart;
use axum::routing::post;
use axum::Router;
use doc2md_client::{ApiClient, ClientConfig, Store};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the mock saw in the last `POST /convert`.
#[derive(Debug, Default, Clone)]
pub struct Upload {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_bytes: Vec<u8>,
}

pub type Captured = Arc<Mutex<Option<Upload>>>;

/// Serve `app` on an ephemeral port; returns the API base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

pub fn client(base_url: &str) -> ApiClient {
    client_with_timeout(base_url, 5)
}

pub fn client_with_timeout(base_url: &str, secs: u64) -> ApiClient {
    let config = ClientConfig::builder()
        .base_url(base_url)
        .timeout_secs(secs)
        .build()
        .unwrap();
    ApiClient::new(config).unwrap()
}

pub fn store(base_url: &str) -> Store {
    Store::new(client(base_url))
}

/// `/api/convert` route that records the multipart upload and replies `reply`.
pub fn capturing_convert(captured: Captured, reply: serde_json::Value) -> Router {
    Router::new().route(
        "/api/convert",
        post(move |mut multipart: Multipart| async move {
            let mut upload = Upload::default();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                if name == "file" {
                    upload.file_name = field.file_name().map(str::to_owned);
                    upload.file_type = field.content_type().map(str::to_owned);
                    upload.file_bytes = field.bytes().await.unwrap().to_vec();
                } else {
                    upload.fields.insert(name, field.text().await.unwrap());
                }
            }
            *captured.lock().unwrap() = Some(upload);
            axum::Json(reply)
        }),
    )
}

/// Raw TCP server that answers the first request with `502` headers
/// promising a 100-byte body, sends 7 bytes of it, then either stalls
/// (`stall = true`) or closes the connection. Returns the API base URL.
pub async fn spawn_truncated_error_server(stall: bool) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 502 Bad Gateway\r\n\
                  content-type: text/plain\r\n\
                  content-length: 100\r\n\r\n\
                  upstrea",
            )
            .await
            .unwrap();
        socket.flush().await.unwrap();
        if stall {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        }
        drop(socket);
    });
    format!("http://{addr}/api")
}
