use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::state::data::{
    non_empty, ArchiveReady, DownloadRequest, DownloadResponse, GenerateRequest,
    GenerateResponse, Generated, StatusResponse,
};

/// Shown when the server reports failure without saying why
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// Client for the gallery server
///
/// Cheap to clone; every background task gets its own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    /// Limit for JSON calls and thumbnails; archives are only bounded on connect
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Build a client for `server_url`, e.g. `http://127.0.0.1:5000`
    ///
    /// `timeout` bounds each JSON exchange and image fetch; `None` waits
    /// indefinitely, which a large search may need. Archive downloads only
    /// use it as a connect timeout, so a big ZIP on a slow link can finish.
    pub fn new(server_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base = Url::parse(server_url)
            .map_err(|e| Error::Config(format!("invalid server URL '{}': {}", server_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid server URL '{}'", server_url)));
        }
        // Endpoints are joined relative to the base, so it must end in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, base, timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a URL handed out by the server (usually `/image/...`)
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base
            .join(url)
            .map_err(|e| Error::Transport(format!("invalid URL '{}': {}", url, e)))
    }

    /// `POST /generate`
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Generated> {
        let response: GenerateResponse = self.post_json("generate", request).await?;
        if !response.success {
            return Err(server_error(response.message));
        }

        Ok(Generated {
            message: response.message.unwrap_or_default(),
            session_id: response.session_id,
            images: response.images,
        })
    }

    /// `POST /download-selected`
    pub async fn download_selected(&self, request: &DownloadRequest) -> Result<ArchiveReady> {
        let response: DownloadResponse = self.post_json("download-selected", request).await?;
        if !response.success {
            return Err(server_error(response.message));
        }

        let zip_file = non_empty(response.zip_file)
            .ok_or_else(|| Error::Server("Server did not name the archive".to_string()))?;
        Ok(ArchiveReady {
            message: response.message.unwrap_or_default(),
            zip_file,
        })
    }

    /// `POST /cleanup`; returns the server's message
    pub async fn cleanup(&self) -> Result<String> {
        let response: StatusResponse = self.post_json("cleanup", &serde_json::json!({})).await?;
        if !response.success {
            return Err(server_error(response.message));
        }
        Ok(response.message.unwrap_or_default())
    }

    /// Raw bytes of an image listed in a search result
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url)?;
        let response = self.bounded(self.http.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP status: {}", status)));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch `/download-zip/<zip_file>` and write it into `dest_dir`
    ///
    /// The body goes to `<name>.part` first and is renamed into place once
    /// complete, so a failed transfer never leaves a truncated archive under
    /// the real name. Returns the path of the written archive.
    pub async fn save_archive(&self, zip_file: &str, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = Path::new(zip_file)
            .file_name()
            .ok_or_else(|| Error::Server(format!("Invalid archive name '{}'", zip_file)))?;
        let dest = dest_dir.join(file_name);
        let mut part_name = file_name.to_os_string();
        part_name.push(".part");
        let part = dest_dir.join(part_name);

        let url = self.archive_url(zip_file)?;
        tracing::info!(%url, dest = %dest.display(), "downloading archive");

        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP status: {}", status)));
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let written = match stream_to_file(&mut response, &part).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(e) = tokio::fs::remove_file(&part).await {
                    tracing::debug!(part = %part.display(), error = %e, "partial archive not removed");
                }
                return Err(err);
            }
        };
        tokio::fs::rename(&part, &dest).await?;

        tracing::debug!(bytes = written, "archive written");
        Ok(dest)
    }

    /// `download-zip/<zip_file>` with the name percent-encoded as one segment
    pub fn archive_url(&self, zip_file: &str) -> Result<Url> {
        let mut url = self.resolve("download-zip/")?;
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("invalid server URL '{}'", self.base)))?
            .pop_if_empty()
            .push(zip_file);
        Ok(url)
    }

    /// POST `body` as JSON and parse the reply as `R`, whatever the status
    ///
    /// The server sends `{success: false, message}` with 4xx/5xx codes, so
    /// the body is always parsed first. Anything that is not JSON counts as
    /// a transport failure.
    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.resolve(endpoint)?;
        tracing::debug!(%url, "POST");

        let response = self.bounded(self.http.post(url).json(body)).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes).map_err(|e| parse_error(status, &e))
    }

    fn bounded(&self, request: RequestBuilder) -> RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

/// Write the remaining body of `response` to a fresh file at `path`
async fn stream_to_file(response: &mut Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn server_error(message: Option<String>) -> Error {
    Error::Server(non_empty(message).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
}

fn parse_error(status: StatusCode, err: &serde_json::Error) -> Error {
    if status.is_success() {
        Error::Transport(format!("invalid response: {}", err))
    } else {
        Error::Transport(format!("invalid response (HTTP {}): {}", status, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::SessionId;
    use axum::extract::Path as UrlPath;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Serve `router` on an ephemeral port and return its base URL
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = ApiClient::new("http://example.com/gallery", None).unwrap();
        assert_eq!(api.base_url().as_str(), "http://example.com/gallery/");
        assert_eq!(
            api.resolve("generate").unwrap().as_str(),
            "http://example.com/gallery/generate"
        );
        assert_eq!(
            api.resolve("/image/s1/a.jpg").unwrap().as_str(),
            "http://example.com/image/s1/a.jpg"
        );
    }

    #[test]
    fn test_invalid_server_url_is_a_config_error() {
        assert!(matches!(ApiClient::new("not a url", None), Err(Error::Config(_))));
        assert!(matches!(ApiClient::new("mailto:a@b.c", None), Err(Error::Config(_))));
    }

    #[test]
    fn test_archive_url_encodes_name() {
        let api = ApiClient::new("http://localhost:5000", None).unwrap();
        assert_eq!(
            api.archive_url("red cars_1_selected.zip").unwrap().as_str(),
            "http://localhost:5000/download-zip/red%20cars_1_selected.zip"
        );
    }

    #[tokio::test]
    async fn test_generate_sends_query_and_limit() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/generate",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    Json(json!({
                        "success": true,
                        "message": "Done",
                        "session_id": "abc123",
                        "images": [
                            {"filename": "a.jpg", "url": "/img/a.jpg"},
                            {"filename": "b.jpg", "url": "/img/b.jpg"},
                            {"filename": "c.jpg", "url": "/img/c.jpg"}
                        ]
                    }))
                }
            }),
        );
        let api = client(&serve(router).await);

        let generated = api
            .generate(&GenerateRequest { query: "cats".into(), limit: 3 })
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().take(), Some(json!({"query": "cats", "limit": 3})));
        assert_eq!(generated.message, "Done");
        assert_eq!(generated.session_id, Some(SessionId::new("abc123")));
        assert_eq!(generated.images.len(), 3);
        assert_eq!(generated.images[2].url, "/img/c.jpg");
    }

    #[tokio::test]
    async fn test_generate_failure_uses_server_message() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                (
                    AxumStatus::NOT_FOUND,
                    Json(json!({"success": false, "message": "No images found"})),
                )
            }),
        );
        let api = client(&serve(router).await);

        let err = api
            .generate(&GenerateRequest { query: "zzz".into(), limit: 1 })
            .await
            .unwrap_err();
        assert_eq!(err, Error::Server("No images found".into()));
    }

    #[tokio::test]
    async fn test_failure_without_message_falls_back() {
        let router = Router::new().route(
            "/download-selected",
            post(|| async { Json(json!({"success": false, "message": ""})) }),
        );
        let api = client(&serve(router).await);

        let err = api
            .download_selected(&DownloadRequest { session_id: None, images: vec!["a.jpg".into()] })
            .await
            .unwrap_err();
        assert_eq!(err, Error::Server(FALLBACK_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_unparseable_500_is_a_transport_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "<html>Internal Server Error</html>") }),
        );
        let api = client(&serve(router).await);

        let err = api
            .generate(&GenerateRequest { query: "cats".into(), limit: 3 })
            .await
            .unwrap_err();
        match err {
            Error::Transport(detail) => assert!(detail.contains("500"), "{}", detail),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_transport_error() {
        // Bind and drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr));
        let err = api.cleanup().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().starts_with("Network error: "));
    }

    #[tokio::test]
    async fn test_download_selected_posts_selection() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/download-selected",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    Json(json!({"success": true, "message": "ZIP ready", "zip_file": "abc123.zip"}))
                }
            }),
        );
        let api = client(&serve(router).await);

        let ready = api
            .download_selected(&DownloadRequest {
                session_id: Some(SessionId::new("abc123")),
                images: vec!["a.jpg".into(), "c.jpg".into()],
            })
            .await
            .unwrap();

        assert_eq!(
            seen.lock().unwrap().take(),
            Some(json!({"session_id": "abc123", "images": ["a.jpg", "c.jpg"]}))
        );
        assert_eq!(
            ready,
            ArchiveReady { message: "ZIP ready".into(), zip_file: "abc123.zip".into() }
        );
    }

    #[tokio::test]
    async fn test_success_without_archive_name_is_rejected() {
        let router = Router::new().route(
            "/download-selected",
            post(|| async { Json(json!({"success": true, "message": "ZIP ready"})) }),
        );
        let api = client(&serve(router).await);

        let err = api
            .download_selected(&DownloadRequest { session_id: None, images: vec!["a.jpg".into()] })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server(_)));
    }

    #[tokio::test]
    async fn test_save_archive_writes_file() {
        let router = Router::new().route(
            "/download-zip/:file",
            get(|UrlPath(file): UrlPath<String>| async move { format!("PK-{}", file) }),
        );
        let api = client(&serve(router).await);
        let dir = tempfile::tempdir().unwrap();

        let path = api
            .save_archive("red cars_1_selected.zip", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("red cars_1_selected.zip"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "PK-red cars_1_selected.zip"
        );
        assert!(!dir.path().join("red cars_1_selected.zip.part").exists());
    }

    #[tokio::test]
    async fn test_save_archive_reports_missing_file() {
        let router = Router::new().route(
            "/download-zip/:file",
            get(|| async {
                (
                    AxumStatus::NOT_FOUND,
                    Json(json!({"success": false, "message": "File not found"})),
                )
            }),
        );
        let api = client(&serve(router).await);
        let dir = tempfile::tempdir().unwrap();

        let err = api.save_archive("gone.zip", dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!dir.path().join("gone.zip").exists());
    }

    #[tokio::test]
    async fn test_interrupted_archive_leaves_no_file() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promise 1000 bytes, send a few, then hang up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\nPK-partial")
                .await
                .unwrap();
            socket.flush().await.unwrap();
        });
        let api = client(&format!("http://{}", addr));
        let dir = tempfile::tempdir().unwrap();

        let err = api.save_archive("cut.zip", dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{:?}", err);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_applies_to_json_calls_but_not_archives() {
        let router = Router::new()
            .route(
                "/cleanup",
                post(|| async {
                    tokio::time::sleep(Duration::from_millis(600)).await;
                    Json(json!({"success": true, "message": "late"}))
                }),
            )
            .route(
                "/download-zip/:file",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(600)).await;
                    "PK-slow"
                }),
            );
        let base = serve(router).await;
        let api = ApiClient::new(&base, Some(Duration::from_millis(200))).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = api.cleanup().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{:?}", err);

        let path = api.save_archive("slow.zip", dir.path()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "PK-slow");
    }

    #[tokio::test]
    async fn test_cleanup_returns_message() {
        let router = Router::new().route(
            "/cleanup",
            post(|| async { Json(json!({"success": true, "message": "Cleanup completed"})) }),
        );
        let api = client(&serve(router).await);

        assert_eq!(api.cleanup().await.unwrap(), "Cleanup completed");
    }

    #[tokio::test]
    async fn test_fetch_image_resolves_server_relative_url() {
        let router = Router::new().route(
            "/image/:session/:file",
            get(|UrlPath((session, file)): UrlPath<(String, String)>| async move {
                format!("{}/{}", session, file).into_bytes()
            }),
        );
        let api = client(&serve(router).await);

        let bytes = api.fetch_image("/image/s1/a.jpg").await.unwrap();
        assert_eq!(bytes, b"s1/a.jpg");
    }
}
