// src/fetch/mod.rs
use crate::error::{LoadError, LoadResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};
use tracing::{debug, warn};
use url::Url;

/// Where data resources live: behind the static file server, or in a local
/// directory laid out the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Http(Url),
    Directory(PathBuf),
}

impl FromStr for DataSource {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            // `Url::join` replaces the last segment unless the base ends in '/'
            let with_slash = if s.ends_with('/') {
                s.to_string()
            } else {
                format!("{s}/")
            };
            let url = Url::parse(&with_slash)
                .map_err(|e| LoadError::Config(format!("data source {s}: {e}")))?;
            Ok(DataSource::Http(url))
        } else if s.is_empty() {
            Err(LoadError::Config("data source is empty".into()))
        } else {
            Ok(DataSource::Directory(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Http(url) => write!(f, "{url}"),
            DataSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Reads data resources by relative path. Cheap to clone; every fetch is
/// bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    source: DataSource,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(source: DataSource, timeout: Duration) -> LoadResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Config(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            source,
            timeout,
        })
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Full text of the resource at `path`, or `ResourceUnavailable`.
    pub async fn fetch_text(&self, path: &str) -> LoadResult<String> {
        let read = async {
            match &self.source {
                DataSource::Http(base) => self.get_text(base, path).await,
                DataSource::Directory(dir) => {
                    let full = dir.join(path);
                    debug!(path = %full.display(), "reading file");
                    // invalid UTF-8 decodes to U+FFFD, as it does over HTTP
                    tokio::fs::read(&full)
                        .await
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        .map_err(|e| LoadError::unavailable(path, e))
                }
            }
        };

        match tokio::time::timeout(self.timeout, read).await {
            Ok(result) => result,
            Err(_) => {
                warn!(path, timeout = ?self.timeout, "fetch timed out");
                Err(LoadError::unavailable(
                    path,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        }
    }

    /// Fetch `path` and deserialize it as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> LoadResult<T> {
        let text = self.fetch_text(path).await?;
        serde_json::from_str(&text).map_err(|e| LoadError::invalid(path, e))
    }

    async fn get_text(&self, base: &Url, path: &str) -> LoadResult<String> {
        let url = base
            .join(path)
            .map_err(|e| LoadError::unavailable(path, format!("bad url: {e}")))?;
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::unavailable(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::unavailable(path, format!("HTTP {status}")));
        }
        resp.text()
            .await
            .map_err(|e| LoadError::unavailable(path, format!("reading body from {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single HTTP response on a local port and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut seen = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
                if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/csv\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn fetcher(source: &str) -> Fetcher {
        Fetcher::new(source.parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_data_source_parsing() {
        assert_eq!(
            "http://localhost:8000".parse::<DataSource>().unwrap(),
            DataSource::Http(Url::parse("http://localhost:8000/").unwrap())
        );
        assert_eq!(
            "./site".parse::<DataSource>().unwrap(),
            DataSource::Directory(PathBuf::from("./site"))
        );
        assert!("  ".parse::<DataSource>().is_err());
    }

    #[tokio::test]
    async fn test_directory_fetch() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/Bed.csv"), "a,b\n1,2\n").unwrap();

        let f = fetcher(dir.path().to_str().unwrap());
        assert_eq!(f.fetch_text("data/Bed.csv").await.unwrap(), "a,b\n1,2\n");

        let err = f.fetch_text("data/missing.csv").await.unwrap_err();
        assert!(matches!(err, LoadError::ResourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_directory_fetch_decodes_invalid_utf8_lossily() {
        let dir = tempdir().unwrap();
        let bytes = b"name,beds\nSoci\xe9t\xe9,10\nRoyal,5\n";
        std::fs::write(dir.path().join("Bed.csv"), bytes).unwrap();

        let text = fetcher(dir.path().to_str().unwrap())
            .fetch_text("Bed.csv")
            .await
            .unwrap();
        assert_eq!(text, "name,beds\nSoci\u{fffd}t\u{fffd},10\nRoyal,5\n");
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let base = serve_once("200 OK", "h\n1\n").await;
        let f = fetcher(&base);
        assert_eq!(f.fetch_text("data/Birth Death.csv").await.unwrap(), "h\n1\n");
    }

    #[tokio::test]
    async fn test_http_non_success_is_unavailable() {
        let base = serve_once("404 Not Found", "nope").await;
        let err = fetcher(&base).fetch_text("data/Vistor.csv").await.unwrap_err();
        match err {
            LoadError::ResourceUnavailable { path, reason } => {
                assert_eq!(path, "data/Vistor.csv");
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_transport_error_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher(&format!("http://{addr}"))
            .fetch_text("data/Bed.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::ResourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_http_stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(sock);
        });

        let f = Fetcher::new(
            format!("http://{addr}").parse().unwrap(),
            Duration::from_millis(100),
        )
        .unwrap();
        let start = std::time::Instant::now();
        let err = f.fetch_text("data/Vistor.csv").await.unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(3));
        match err {
            LoadError::ResourceUnavailable { path, .. } => assert_eq!(path, "data/Vistor.csv"),
            other => panic!("unexpected error: {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_garbage() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.geojson"), "{not json").unwrap();
        let err = fetcher(dir.path().to_str().unwrap())
            .fetch_json::<serde_json::Value>("x.geojson")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidDocument { .. }));
    }
}
