//! The remote content API as seen by the session.

use std::future::Future;

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{
    Annotation, AnnotationId, AnnotationPatch, Book, BookId, Chapter, NewAnnotation, QuickQuery,
    QuickSearchResult,
};
use crate::navigation::ReloadTicket;

/// Which annotations to fetch for a reading view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationScope {
    pub book_id: BookId,
    pub chapter: u32,
}

impl From<&ReloadTicket> for AnnotationScope {
    fn from(ticket: &ReloadTicket) -> Self {
        Self {
            book_id: ticket.book_id,
            chapter: ticket.chapter,
        }
    }
}

/// Request/response access to books, chapters, annotations and search.
///
/// Retries and timeouts are the implementation's business; callers only see
/// the final `Result`.
pub trait ContentClient {
    fn books(&self) -> impl Future<Output = Result<Vec<Book>>> + Send;

    fn chapter(&self, book_id: BookId, number: u32) -> impl Future<Output = Result<Chapter>> + Send;

    fn annotations(
        &self,
        scope: AnnotationScope,
    ) -> impl Future<Output = Result<Vec<Annotation>>> + Send;

    fn create_annotation(
        &self,
        new: &NewAnnotation,
    ) -> impl Future<Output = Result<Annotation>> + Send;

    fn update_annotation(
        &self,
        id: AnnotationId,
        patch: &AnnotationPatch,
    ) -> impl Future<Output = Result<Annotation>> + Send;

    fn delete_annotation(&self, id: AnnotationId) -> impl Future<Output = Result<()>> + Send;

    fn quick_search(
        &self,
        query: &QuickQuery,
    ) -> impl Future<Output = Result<QuickSearchResult>> + Send;
}

/// Everything fetched for one reload, tagged with the ticket's sequence number
#[derive(Debug, Clone)]
pub struct ReadingLoad {
    pub ticket: ReloadTicket,
    pub chapter: Result<Chapter>,
    pub annotations: Result<Vec<Annotation>>,
}

/// Perform the single chapter fetch and single annotation fetch for `ticket`
pub async fn fetch_reading<C: ContentClient>(client: &C, ticket: ReloadTicket) -> ReadingLoad {
    info!(seq = ticket.seq, book = %ticket.book_id, chapter = ticket.chapter, "loading chapter");
    let chapter = client.chapter(ticket.book_id, ticket.chapter).await;
    let annotations = match &chapter {
        Ok(_) => client.annotations(AnnotationScope::from(&ticket)).await,
        // Nothing to annotate; skip the second request
        Err(_) => Ok(Vec::new()),
    };
    if let Err(err) = &annotations {
        warn!(seq = ticket.seq, %err, "annotation fetch failed");
    }
    ReadingLoad {
        ticket,
        chapter,
        annotations,
    }
}
