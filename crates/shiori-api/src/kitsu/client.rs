use reqwest::Client;
use url::Url;

use super::error::KitsuError;
use super::normalize::normalize;
use super::types::{JsonApiListResponse, JsonApiSingleResourceResponse};
use crate::traits::{CatalogPage, CatalogQuery, CatalogRecord, CatalogSource};

pub const DEFAULT_BASE_URL: &str = "https://kitsu.io/api/edge";

/// Largest `page[limit]` Kitsu accepts for `/anime`.
pub const MAX_PAGE_LIMIT: u32 = 20;

const ACCEPT: &str = "application/vnd.api+json";

/// Anonymous Kitsu JSON:API client.
#[derive(Debug, Clone)]
pub struct KitsuClient {
    base_url: String,
    http: Client,
}

impl Default for KitsuClient {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }
}

impl KitsuClient {
    /// Build a client against `base_url` (e.g. a mirror or local proxy).
    pub fn new(base_url: &str) -> Result<Self, KitsuError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, KitsuError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(KitsuError::Api {
                status,
                message: body,
            })
        }
    }

    /// Fetch one page of `/anime` for the given query.
    pub async fn search_anime(&self, query: &CatalogQuery) -> Result<CatalogPage, KitsuError> {
        let params = query.to_params();
        tracing::debug!(?params, "kitsu: GET /anime");

        let resp = self
            .http
            .get(format!("{}/anime", self.base_url))
            .header("Accept", ACCEPT)
            .query(&params)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: JsonApiListResponse = resp
            .json()
            .await
            .map_err(|e| KitsuError::Parse(e.to_string()))?;

        let page = body.into_page();
        tracing::debug!(
            records = page.records.len(),
            total = ?page.total_count,
            has_next = page.has_next,
            "kitsu: page received"
        );
        Ok(page)
    }

    /// Fetch a single anime by its Kitsu id.
    pub async fn get_anime_by_id(&self, anime_id: u64) -> Result<CatalogRecord, KitsuError> {
        tracing::debug!(anime_id, "kitsu: GET /anime/{{id}}");

        let resp = self
            .http
            .get(format!("{}/anime/{anime_id}", self.base_url))
            .header("Accept", ACCEPT)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: JsonApiSingleResourceResponse = resp
            .json()
            .await
            .map_err(|e| KitsuError::Parse(e.to_string()))?;

        Ok(normalize(&body.data))
    }
}

impl CatalogSource for KitsuClient {
    type Error = KitsuError;

    async fn search(&self, query: &CatalogQuery) -> Result<CatalogPage, KitsuError> {
        self.search_anime(query).await
    }

    async fn get_anime(&self, id: u64) -> Result<CatalogRecord, KitsuError> {
        self.get_anime_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    /// Serve one canned HTTP response on a local port.
    ///
    /// Returns the base URL and a receiver for the request line the client
    /// sent.
    async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            let line = text.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(line);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        (format!("http://{addr}/api/edge"), rx)
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let (base, request_line) = serve_once("503 Service Unavailable", "down for maintenance").await;
        let client = KitsuClient::new(&base).unwrap();
        let query = CatalogQuery {
            text: "frieren".into(),
            page: 2,
            limit: 20,
            ..Default::default()
        };

        let err = client.search_anime(&query).await.unwrap_err();
        match err {
            KitsuError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "down for maintenance");
            }
            other => panic!("expected Api error, got {other:?}"),
        }

        let line = request_line.await.unwrap();
        assert!(line.starts_with("GET /api/edge/anime?"), "{line}");
        assert!(line.contains("page%5Blimit%5D=20"), "{line}");
        assert!(line.contains("page%5Boffset%5D=20"), "{line}");
        assert!(line.contains("filter%5Btext%5D=frieren"), "{line}");
    }

    #[tokio::test]
    async fn test_html_body_is_parse_error() {
        let html = "<html><body>Bad gateway</body></html>";

        let (base, _) = serve_once("200 OK", html).await;
        let err = KitsuClient::new(&base)
            .unwrap()
            .search_anime(&CatalogQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KitsuError::Parse(_)), "{err:?}");

        let (base, request_line) = serve_once("200 OK", html).await;
        let err = KitsuClient::new(&base)
            .unwrap()
            .get_anime_by_id(46474)
            .await
            .unwrap_err();
        assert!(matches!(err, KitsuError::Parse(_)), "{err:?}");
        assert!(request_line.await.unwrap().starts_with("GET /api/edge/anime/46474 "));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = KitsuClient::new("http://localhost:8080/api/edge/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/edge");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = KitsuClient::new("not a url").unwrap_err();
        assert!(matches!(err, KitsuError::InvalidUrl(_)));
    }

    #[test]
    fn test_default_points_at_public_api() {
        assert_eq!(KitsuClient::default().base_url(), DEFAULT_BASE_URL);
    }
}
