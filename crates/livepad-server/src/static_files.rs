//! Static file serving
//!
//! Serves the client page and its assets from a directory. Directories
//! resolve to their `index.html`; nothing outside the root is reachable.

use crate::error::HttpError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// MIME type detection based on file extension
fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Calculate ETag from file metadata
fn calculate_etag(modified: SystemTime, size: u64) -> String {
    let timestamp = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("\"{:x}-{:x}\"", timestamp, size)
}

/// Static file root and response settings
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
    max_age: u64,
}

impl StaticFiles {
    /// Serve files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
            max_age: 0,
        }
    }

    /// Set the Cache-Control max-age in seconds (0 sends `no-cache`)
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve the file addressed by a request path
    ///
    /// Answers `304 Not Modified` when `If-None-Match` matches the ETag.
    pub async fn serve(
        &self,
        request_path: &str,
        request_headers: &HeaderMap,
    ) -> Result<Response<Full<Bytes>>, HttpError> {
        let mut file_path = self.root.join(sanitize_path(request_path));

        if fs::metadata(&file_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            file_path.push(&self.index_file);
        }

        let metadata = fs::metadata(&file_path)
            .await
            .map_err(|_| HttpError::not_found(format!("No such file: {}", request_path)))?;
        if !metadata.is_file() {
            return Err(HttpError::not_found(format!(
                "No such file: {}",
                request_path
            )));
        }

        let etag = metadata
            .modified()
            .ok()
            .map(|modified| calculate_etag(modified, metadata.len()));

        if let (Some(etag), Some(if_none_match)) = (&etag, request_headers.get(header::IF_NONE_MATCH))
        {
            if if_none_match.as_bytes() == etag.as_bytes() {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::NOT_MODIFIED;
                self.insert_cache_headers(response.headers_mut(), Some(etag));
                return Ok(response);
            }
        }

        let content = fs::read(&file_path)
            .await
            .map_err(|e| HttpError::internal(format!("Failed to read file: {}", e)))?;

        let extension = file_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut response = Response::new(Full::new(Bytes::from(content)));
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(mime_type_for_extension(extension)),
        );
        self.insert_cache_headers(headers, etag.as_ref());

        Ok(response)
    }

    fn insert_cache_headers(&self, headers: &mut HeaderMap, etag: Option<&String>) {
        if let Some(value) = etag.and_then(|e| HeaderValue::from_str(e).ok()) {
            headers.insert(header::ETAG, value);
        }
        let cache_control = if self.max_age > 0 {
            format!("public, max-age={}", self.max_age)
        } else {
            "no-cache".to_string()
        };
        if let Ok(value) = HeaderValue::from_str(&cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }
    }
}

/// Sanitize a request path to prevent directory traversal
fn sanitize_path(path: &str) -> PathBuf {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != ".." && !part.contains('\\'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(mime_type_for_extension("html"), "text/html; charset=utf-8");
        assert_eq!(mime_type_for_extension("JS"), "text/javascript; charset=utf-8");
        assert_eq!(mime_type_for_extension("css"), "text/css; charset=utf-8");
        assert_eq!(mime_type_for_extension("bin"), "application/octet-stream");
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/file.txt"), PathBuf::from("file.txt"));
        assert_eq!(sanitize_path("../../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize_path("foo/../bar"), PathBuf::from("foo/bar"));
        assert_eq!(sanitize_path("./a/./b"), PathBuf::from("a/b"));
        assert_eq!(sanitize_path("/"), PathBuf::new());
    }

    #[test]
    fn test_etag_format() {
        let time = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        assert_eq!(calculate_etag(time, 255), "\"f4240-ff\"");
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>livepad</h1>").unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve("/", &HeaderMap::new()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>livepad</h1>");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());

        let err = files.serve("/nope.js", &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // A directory without an index is not served either
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        let err = files.serve("/assets", &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_matching_etag_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let files = StaticFiles::new(dir.path()).max_age(60);

        let first = files.serve("/app.js", &HeaderMap::new()).await.unwrap();
        let etag = first.headers()[header::ETAG].clone();
        assert_eq!(first.headers()[header::CACHE_CONTROL], "public, max-age=60");

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, etag);
        let second = files.serve("/app.js", &headers).await.unwrap();
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }
}
