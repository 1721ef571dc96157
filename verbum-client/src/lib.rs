//! HTTP implementation of [`ContentClient`] for the Verbum REST API.
//!
//! Every endpoint answers with the `{ success, data, error }` envelope. The
//! mapping into [`ReaderError`] is:
//!
//! | Failure | Error |
//! |---------|-------|
//! | connect, timeout, body read | `Network` |
//! | `success: false` (any status) | `Api` with the backend's text |
//! | body that is not an envelope | `Decode`, or `Api` for an error status |

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use verbum_core::api::{decode, Envelope};
use verbum_core::model::ChapterPayload;
use verbum_core::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationScope, Book, BookId, Chapter,
    ContentClient, NewAnnotation, QuickQuery, QuickSearchResult, ReaderError, Result,
};

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// `limit` sent to `GET /api/annotations`
const ANNOTATION_PAGE_SIZE: usize = 500;

/// Content client backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpContentClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`. Paths are
    /// resolved under `<base_url>/api/`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .user_agent(concat!("verbum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReaderError::Network(e.to_string()))?;
        Self::with_client(http, base_url)
    }

    /// Use a preconfigured `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .and_then(|root| root.join("api/"))
            .map_err(|e| ReaderError::validation(format!("invalid API URL {base_url:?}: {e}")))?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ReaderError::validation(format!("invalid endpoint {path:?}: {e}")))
    }

    /// Send and decode the envelope, keeping transport and protocol errors apart
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(network_error)?;
        debug!(%url, %status, bytes = body.len(), "response received");

        match decode::<T>(&body) {
            Ok(envelope) => {
                if !status.is_success() && envelope.success {
                    warn!(%url, %status, "error status with a successful envelope");
                    return Err(status_error(status));
                }
                Ok(envelope)
            }
            Err(err) if status.is_success() => Err(err),
            Err(_) => Err(status_error(status)),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request).await?.into_result()
    }
}

fn network_error(err: reqwest::Error) -> ReaderError {
    warn!(%err, "request failed");
    ReaderError::Network(err.to_string())
}

fn status_error(status: StatusCode) -> ReaderError {
    let text = match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    };
    ReaderError::Api(format!("server returned {text}"))
}

impl ContentClient for HttpContentClient {
    async fn books(&self) -> Result<Vec<Book>> {
        let url = self.endpoint("books")?;
        self.fetch(self.http.get(url)).await
    }

    async fn chapter(&self, book_id: BookId, number: u32) -> Result<Chapter> {
        let url = self.endpoint(&format!("books/{book_id}/chapters/{number}"))?;
        let payload: ChapterPayload = self.fetch(self.http.get(url)).await?;
        Ok(payload.into_chapter(None))
    }

    /// The backend filters by book only and pages newest first, so every page
    /// is followed; the session keeps what belongs to the chapter.
    async fn annotations(&self, scope: AnnotationScope) -> Result<Vec<Annotation>> {
        let mut all: Vec<Annotation> = Vec::new();
        loop {
            let mut url = self.endpoint("annotations")?;
            url.query_pairs_mut()
                .append_pair("book_id", &scope.book_id.to_string())
                .append_pair("chapter", &scope.chapter.to_string())
                .append_pair("limit", &ANNOTATION_PAGE_SIZE.to_string())
                .append_pair("offset", &all.len().to_string());

            let envelope = self.send::<Vec<Annotation>>(self.http.get(url)).await?;
            let more = envelope.pagination.is_some_and(|p| p.has_more);
            let page = envelope.into_result()?;
            let empty = page.is_empty();
            all.extend(page);
            if !more || empty {
                break;
            }
            debug!(fetched = all.len(), "following annotation page");
        }
        Ok(all)
    }

    async fn create_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation> {
        let url = self.endpoint("annotations")?;
        self.fetch(self.http.post(url).json(annotation)).await
    }

    async fn update_annotation(
        &self,
        id: AnnotationId,
        patch: &AnnotationPatch,
    ) -> Result<Annotation> {
        let url = self.endpoint(&format!("annotations/{id}"))?;
        self.fetch(self.http.put(url).json(patch)).await
    }

    async fn delete_annotation(&self, id: AnnotationId) -> Result<()> {
        let url = self.endpoint(&format!("annotations/{id}"))?;
        self.send::<serde_json::Value>(self.http.delete(url))
            .await?
            .into_unit()
    }

    async fn quick_search(&self, query: &QuickQuery) -> Result<QuickSearchResult> {
        let mut url = self.endpoint("search/quick")?;
        url.query_pairs_mut().append_pair("q", query.as_str());
        self.fetch(self.http.get(url)).await
    }
}
