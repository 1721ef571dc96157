//! The single client-side state tree for one open reader.
//!
//! Navigation hands out [`ReloadTicket`]s; whoever performs the fetch hands
//! the result back tagged with the ticket's sequence number. Only the latest
//! ticket's result is applied, whatever order the responses arrive in.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::annotations::AnnotationStore;
use crate::content::{fetch_reading, ContentClient, ReadingLoad};
use crate::error::{NotFoundTarget, ReaderError, Result};
use crate::model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, Book, BookId, Chapter,
    HighlightColor, Library, NewAnnotation, QuickQuery, QuickSearchResult, SearchHit, VerseId,
};
use crate::navigation::{Direction, NavigationState, ReloadTicket};
use crate::panels::{GestureConfig, PanelState, ViewportClass, ViewportObserver};
use crate::selection::SelectionMachine;

/// What the reading pane shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    /// No book selected yet
    Empty,
    Loading { book_id: BookId, chapter: u32 },
    Ready(Chapter),
    /// Load failed; navigation state is kept so the user can retry
    Failed { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LibraryState {
    #[default]
    Loading,
    Ready(Library),
    Failed(String),
}

/// A quick-search request the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: QuickQuery,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub input: String,
    pub results: Vec<SearchHit>,
    pub in_flight: bool,
    latest_seq: u64,
}

pub struct ReadingSession {
    pub navigation: NavigationState,
    pub annotations: AnnotationStore,
    pub selection: SelectionMachine,
    pub panels: PanelState,
    pub library: LibraryState,
    pub content: ContentState,
    pub search: SearchState,
    /// Verse the view should scroll to and flash
    pub focused_verse: Option<u32>,
    pub status_message: Option<String>,
}

impl ReadingSession {
    pub fn new(observer: &impl ViewportObserver, gestures: GestureConfig) -> Self {
        Self {
            navigation: NavigationState::new(),
            annotations: AnnotationStore::new(),
            selection: SelectionMachine::new(),
            panels: PanelState::new(observer, gestures),
            library: LibraryState::Loading,
            content: ContentState::Empty,
            search: SearchState::default(),
            focused_verse: None,
            status_message: None,
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        match &self.content {
            ContentState::Ready(chapter) => Some(chapter),
            _ => None,
        }
    }

    pub fn library(&self) -> Option<&Library> {
        match &self.library {
            LibraryState::Ready(library) => Some(library),
            _ => None,
        }
    }

    /// "John 3" for the header
    pub fn title(&self) -> String {
        match self.navigation.selected_book() {
            Some(book) => format!("{} {}", book.name, self.navigation.selected_chapter()),
            None => "No book selected".to_string(),
        }
    }

    pub fn apply_books(&mut self, books: Result<Vec<Book>>) {
        self.library = match books {
            Ok(books) => {
                info!(count = books.len(), "book list loaded");
                LibraryState::Ready(Library::new(books))
            }
            Err(err) => {
                error!(%err, "book list failed");
                LibraryState::Failed(err.to_string())
            }
        };
    }

    // Navigation

    pub fn select_book(&mut self, book: Book) -> ReloadTicket {
        let ticket = self.navigation.select_book(book);
        if self.panels.viewport_class() == ViewportClass::Mobile {
            self.panels.set_open(crate::panels::Panel::Sidebar, false);
        }
        self.start_loading(ticket)
    }

    pub fn select_book_by_id(&mut self, id: BookId) -> Result<ReloadTicket> {
        let book = self.find_book(id)?;
        Ok(self.select_book(book))
    }

    pub fn change_chapter(&mut self, direction: Direction) -> Option<ReloadTicket> {
        let ticket = self.navigation.change_chapter(direction)?;
        Some(self.start_loading(ticket))
    }

    pub fn jump_to_reference(
        &mut self,
        book: Book,
        chapter: u32,
        verse: Option<u32>,
    ) -> Option<ReloadTicket> {
        let displayed = self.chapter().map(|c| (c.book_id, c.number));
        match self.navigation.jump_to_reference(book, chapter, verse, displayed) {
            Some(ticket) => Some(self.start_loading(ticket)),
            None => {
                self.focused_verse = self.navigation.take_focus();
                None
            }
        }
    }

    /// Navigate to a quick-search hit, resolving its book from the library
    pub fn open_search_hit(&mut self, hit: &SearchHit) -> Result<Option<ReloadTicket>> {
        let book = self.find_book(hit.book_id)?;
        self.search.results.clear();
        self.search.input.clear();
        Ok(self.jump_to_reference(book, hit.chapter, hit.verse))
    }

    /// Reload the current position, typically after a failed load
    pub fn retry(&mut self) -> Option<ReloadTicket> {
        let ticket = self.navigation.reload()?;
        Some(self.start_loading(ticket))
    }

    fn find_book(&self, id: BookId) -> Result<Book> {
        self.library()
            .and_then(|l| l.get(id))
            .cloned()
            .ok_or(ReaderError::NotFound(NotFoundTarget::Book(id)))
    }

    fn start_loading(&mut self, ticket: ReloadTicket) -> ReloadTicket {
        self.selection.cancel();
        self.focused_verse = None;
        self.content = ContentState::Loading {
            book_id: ticket.book_id,
            chapter: ticket.chapter,
        };
        ticket
    }

    /// Apply a finished load. Returns `false` if a newer ticket superseded it.
    pub fn apply_load(&mut self, load: ReadingLoad) -> bool {
        let seq = load.ticket.seq;
        if !self.navigation.is_latest(seq) {
            debug!(seq, latest = ?self.navigation.latest_seq(), "discarding stale load");
            return false;
        }

        match load.chapter {
            Ok(chapter) => {
                self.navigation.set_total_chapters(chapter.total_chapters);
                let verses: HashSet<VerseId> = chapter.verses.iter().map(|v| v.id).collect();
                match load.annotations {
                    Ok(annotations) => self.annotations.load(annotations, &verses),
                    Err(err) => {
                        warn!(%err, "showing chapter without annotations");
                        self.annotations.clear();
                    }
                }
                self.focused_verse = self.navigation.take_focus();
                self.content = ContentState::Ready(chapter);
            }
            Err(err) => {
                error!(seq, %err, "chapter load failed");
                self.annotations.clear();
                self.content = ContentState::Failed {
                    message: err.to_string(),
                };
            }
        }
        true
    }

    // Annotations

    pub fn prepare_annotation(
        &self,
        verse_id: VerseId,
        kind: AnnotationKind,
        color: Option<HighlightColor>,
        note_text: Option<String>,
    ) -> Result<NewAnnotation> {
        self.annotations.prepare(verse_id, kind, color, note_text)
    }

    /// Commit the open annotation menu. Validation errors stay on the menu.
    pub fn commit_selection(&mut self) -> Result<NewAnnotation> {
        self.selection.commit()
    }

    /// The backend confirmed (or rejected) a creation request
    pub fn annotation_created(&mut self, created: Result<Annotation>) -> Option<&Annotation> {
        match created {
            Ok(annotation) => {
                let id = annotation.id;
                let on_screen = self
                    .chapter()
                    .is_some_and(|c| c.contains_verse(annotation.verse_id));
                if !on_screen {
                    debug!(%id, "created annotation is not on the current chapter");
                    return None;
                }
                self.annotations.insert(annotation);
                self.set_status("Annotation saved");
                self.annotations.get(id)
            }
            Err(err) => {
                warn!(%err, "annotation create failed");
                self.set_status(&format!("Could not save annotation: {err}"));
                None
            }
        }
    }

    /// Remove locally ahead of the backend call; hand the result to
    /// [`ReadingSession::annotation_deleted`].
    pub fn begin_delete(&mut self, id: AnnotationId) -> Result<Annotation> {
        self.annotations.remove(id)
    }

    pub fn annotation_deleted(&mut self, removed: Annotation, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.set_status("Annotation deleted"),
            Err(err) => {
                let on_screen = self
                    .chapter()
                    .is_some_and(|c| c.contains_verse(removed.verse_id));
                if on_screen {
                    warn!(id = %removed.id, %err, "annotation delete failed, restoring");
                    self.annotations.insert(removed);
                } else {
                    warn!(
                        id = %removed.id,
                        %err,
                        "annotation delete failed after leaving its chapter"
                    );
                }
                self.set_status(&format!("Could not delete annotation: {err}"));
            }
        }
    }

    /// Validate an edit against the local copy before sending it
    pub fn begin_update(&self, id: AnnotationId, patch: &AnnotationPatch) -> Result<Annotation> {
        self.annotations.preview_update(id, patch)
    }

    pub fn annotation_updated(&mut self, updated: Result<Annotation>) {
        match updated {
            Ok(annotation) => {
                if self.annotations.get(annotation.id).is_some() {
                    self.annotations.insert(annotation);
                }
                self.set_status("Annotation updated");
            }
            Err(err) => {
                warn!(%err, "annotation update failed");
                self.set_status(&format!("Could not update annotation: {err}"));
            }
        }
    }

    // Search

    /// Record search input. Returns a ticket when the query is long enough to
    /// send; shorter input clears results without touching the network.
    pub fn search_input(&mut self, input: &str) -> Option<SearchTicket> {
        self.search.input = input.to_string();
        self.search.latest_seq += 1;
        match QuickQuery::parse(input) {
            Some(query) => {
                self.search.in_flight = true;
                Some(SearchTicket {
                    seq: self.search.latest_seq,
                    query,
                })
            }
            None => {
                self.search.in_flight = false;
                self.search.results.clear();
                None
            }
        }
    }

    pub fn apply_search(&mut self, seq: u64, result: Result<QuickSearchResult>) -> bool {
        if seq != self.search.latest_seq {
            debug!(seq, latest = self.search.latest_seq, "discarding stale search");
            return false;
        }
        self.search.in_flight = false;
        self.search.results = match result {
            Ok(result) => result.hits(),
            Err(err) => {
                warn!(%err, "quick search failed");
                Vec::new()
            }
        };
        true
    }

    // Sequential drivers for callers that await each step in turn

    /// Fetch and apply one reload
    pub async fn load<C: ContentClient>(&mut self, client: &C, ticket: ReloadTicket) -> bool {
        let load = fetch_reading(client, ticket).await;
        self.apply_load(load)
    }

    pub async fn load_books<C: ContentClient>(&mut self, client: &C) {
        let books = client.books().await;
        self.apply_books(books);
    }

    /// Validate, persist and store a new annotation
    pub async fn create_annotation<C: ContentClient>(
        &mut self,
        client: &C,
        verse_id: VerseId,
        kind: AnnotationKind,
        color: Option<HighlightColor>,
        note_text: Option<String>,
    ) -> Result<Annotation> {
        let new = self.prepare_annotation(verse_id, kind, color, note_text)?;
        let created = client.create_annotation(&new).await?;
        self.annotations.insert(created.clone());
        Ok(created)
    }

    /// Remove locally and on the backend; restores the local copy on failure
    pub async fn delete_annotation<C: ContentClient>(
        &mut self,
        client: &C,
        id: AnnotationId,
    ) -> Result<()> {
        let removed = self.begin_delete(id)?;
        let outcome = client.delete_annotation(id).await;
        let result = outcome.clone();
        self.annotation_deleted(removed, outcome);
        result
    }

    pub async fn update_annotation<C: ContentClient>(
        &mut self,
        client: &C,
        id: AnnotationId,
        patch: &AnnotationPatch,
    ) -> Result<Annotation> {
        self.begin_update(id, patch)?;
        let updated = client.update_annotation(id, patch).await;
        self.annotation_updated(updated.clone());
        updated
    }

    pub async fn quick_search<C: ContentClient>(&mut self, client: &C, input: &str) -> bool {
        let Some(ticket) = self.search_input(input) else {
            return false;
        };
        let result = client.quick_search(&ticket.query).await;
        self.apply_search(ticket.seq, result)
    }
}

#[cfg(test)]
mod tests;
