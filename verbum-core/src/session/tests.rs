use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use super::*;
use crate::content::AnnotationScope;
use crate::model::{Testament, Verse};
use crate::panels::Size;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Books,
    Chapter(BookId, u32),
    Annotations(AnnotationScope),
    Create(NewAnnotation),
    Update(AnnotationId),
    Delete(AnnotationId),
    Search(String),
}

#[derive(Default)]
struct FakeContent {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    stored: Vec<Annotation>,
    fail_annotations: bool,
    fail_delete: bool,
}

impl FakeContent {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn chapter_calls(&self) -> Vec<(BookId, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Chapter(book, n) => Some((book, n)),
                _ => None,
            })
            .collect()
    }
}

fn books() -> Vec<Book> {
    vec![
        Book::new(1, "Genesis", Testament::Old, 50),
        Book::new(57, "Philemon", Testament::New, 1),
        Book::new(43, "John", Testament::New, 21),
    ]
}

fn chapter_for(book_id: BookId, number: u32) -> Chapter {
    let verses = (1..=5)
        .map(|n| Verse {
            id: VerseId(u64::from(number) * 100 + u64::from(n)),
            chapter_number: number,
            verse_num: n,
            text: format!("verse {n} of chapter {number}"),
        })
        .collect();
    let book = books().into_iter().find(|b| b.id == book_id);
    Chapter {
        book_id,
        book_name: book.as_ref().map(|b| b.name.clone()).unwrap_or_default(),
        number,
        total_chapters: book.map(|b| b.chapters_count).unwrap_or(0),
        verses,
    }
}

impl ContentClient for FakeContent {
    async fn books(&self) -> Result<Vec<Book>> {
        self.record(Call::Books);
        Ok(books())
    }

    async fn chapter(&self, book_id: BookId, number: u32) -> Result<Chapter> {
        self.record(Call::Chapter(book_id, number));
        Ok(chapter_for(book_id, number))
    }

    async fn annotations(&self, scope: AnnotationScope) -> Result<Vec<Annotation>> {
        self.record(Call::Annotations(scope));
        if self.fail_annotations {
            return Err(ReaderError::Network("connection reset".into()));
        }
        Ok(self.stored.clone())
    }

    async fn create_annotation(&self, new: &NewAnnotation) -> Result<Annotation> {
        self.record(Call::Create(new.clone()));
        let id = AnnotationId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(Annotation::from_new(id, new.clone(), Utc::now()))
    }

    async fn update_annotation(
        &self,
        id: AnnotationId,
        _patch: &AnnotationPatch,
    ) -> Result<Annotation> {
        self.record(Call::Update(id));
        Err(ReaderError::Api("Annotation not found".into()))
    }

    async fn delete_annotation(&self, id: AnnotationId) -> Result<()> {
        self.record(Call::Delete(id));
        if self.fail_delete {
            return Err(ReaderError::Network("timed out".into()));
        }
        Ok(())
    }

    async fn quick_search(&self, query: &QuickQuery) -> Result<QuickSearchResult> {
        self.record(Call::Search(query.as_str().to_string()));
        Ok(QuickSearchResult::Text { verses: Vec::new() })
    }
}

fn desktop_session() -> ReadingSession {
    ReadingSession::new(
        &Size {
            width: 1200,
            height: 800,
        },
        GestureConfig::default(),
    )
}

async fn session_with_books(client: &FakeContent) -> ReadingSession {
    let mut session = desktop_session();
    session.load_books(client).await;
    session
}

fn loaded(ticket: ReloadTicket) -> ReadingLoad {
    ReadingLoad {
        ticket,
        chapter: Ok(chapter_for(ticket.book_id, ticket.chapter)),
        annotations: Ok(Vec::new()),
    }
}

#[tokio::test]
async fn test_select_book_fetches_first_chapter_once() {
    let client = FakeContent::default();
    for book in books() {
        let mut session = session_with_books(&client).await;
        let before = client.chapter_calls().len();

        let ticket = session.select_book(book.clone());
        assert!(session.load(&client, ticket).await);

        assert_eq!(session.navigation.selected_chapter(), 1);
        assert_eq!(client.chapter_calls()[before..].to_vec(), vec![(book.id, 1)]);
        assert_eq!(session.chapter().map(|c| c.number), Some(1));
    }
}

#[tokio::test]
async fn test_annotations_fetched_scoped_to_chapter() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    let ticket = session.select_book_by_id(BookId(43)).unwrap();
    session.load(&client, ticket).await;

    assert!(client.calls().contains(&Call::Annotations(AnnotationScope {
        book_id: BookId(43),
        chapter: 1,
    })));
}

#[tokio::test]
async fn test_boundary_steps_issue_no_fetch() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    // Philemon has a single chapter: both directions are boundaries
    let ticket = session.select_book_by_id(BookId(57)).unwrap();
    session.load(&client, ticket).await;
    let calls_before = client.calls().len();

    assert_eq!(session.change_chapter(Direction::Next), None);
    assert_eq!(session.change_chapter(Direction::Prev), None);
    assert_eq!(session.navigation.selected_chapter(), 1);
    assert!(matches!(session.content, ContentState::Ready(_)));
    assert_eq!(client.calls().len(), calls_before);
}

#[tokio::test]
async fn test_next_at_last_chapter_keeps_state() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;
    let john = books().into_iter().find(|b| b.id == BookId(43)).unwrap();

    let ticket = session.jump_to_reference(john, 21, None).unwrap();
    session.load(&client, ticket).await;

    assert_eq!(session.change_chapter(Direction::Next), None);
    assert_eq!(session.navigation.selected_chapter(), 21);
    assert_eq!(session.chapter().map(|c| c.number), Some(21));
}

#[test]
fn test_out_of_order_responses_latest_wins() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));

    let first = session.select_book_by_id(BookId(1)).unwrap();
    let second = session.change_chapter(Direction::Next).unwrap();

    // R2 resolves before R1
    assert!(session.apply_load(loaded(second)));
    assert!(!session.apply_load(loaded(first)));

    assert_eq!(session.chapter().map(|c| c.number), Some(2));
    assert_eq!(session.navigation.selected_chapter(), 2);
}

#[test]
fn test_stale_response_for_same_chapter_is_discarded() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));

    let first = session.select_book_by_id(BookId(1)).unwrap();
    let second = session.select_book_by_id(BookId(1)).unwrap();

    let mut stale = loaded(first);
    stale.chapter = Err(ReaderError::Network("late failure".into()));

    assert!(session.apply_load(loaded(second)));
    assert!(!session.apply_load(stale));
    assert!(matches!(session.content, ContentState::Ready(_)));
}

#[test]
fn test_failed_load_keeps_navigation() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));

    let ticket = session.select_book_by_id(BookId(43)).unwrap();
    let next = {
        session.apply_load(loaded(ticket));
        session.change_chapter(Direction::Next).unwrap()
    };
    session.apply_load(ReadingLoad {
        ticket: next,
        chapter: Err(ReaderError::Api("Chapter not found".into())),
        annotations: Ok(Vec::new()),
    });

    assert_eq!(
        session.content,
        ContentState::Failed {
            message: "Chapter not found".into()
        }
    );
    assert_eq!(session.navigation.selected_book().map(|b| b.id), Some(BookId(43)));
    assert_eq!(session.navigation.selected_chapter(), 2);

    let retry = session.retry().unwrap();
    assert_eq!((retry.book_id, retry.chapter), (BookId(43), 2));
    assert!(retry.seq > next.seq);
}

#[tokio::test]
async fn test_annotation_failure_degrades_to_plain_chapter() {
    let client = FakeContent {
        fail_annotations: true,
        ..Default::default()
    };
    let mut session = session_with_books(&client).await;

    let ticket = session.select_book_by_id(BookId(1)).unwrap();
    assert!(session.load(&client, ticket).await);

    assert!(session.chapter().is_some());
    assert!(session.annotations.is_empty());
}

#[tokio::test]
async fn test_create_highlight_requires_color() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    let err = session
        .create_annotation(&client, VerseId(42), AnnotationKind::Highlight, None, None)
        .await;
    assert!(matches!(err, Err(ReaderError::Validation(_))));
    assert!(!client.calls().iter().any(|c| matches!(c, Call::Create(_))));

    let color = "#FFF3CD".parse().ok();
    let created = session
        .create_annotation(&client, VerseId(42), AnnotationKind::Highlight, color, None)
        .await
        .unwrap();

    let found = session.annotations.annotations_for(VerseId(42));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);
    assert_eq!(session.annotations.highlight_for(VerseId(42)), Some(HighlightColor::Amber));
}

#[tokio::test]
async fn test_create_note_requires_text() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    let empty = session
        .create_annotation(&client, VerseId(7), AnnotationKind::Note, None, Some(String::new()))
        .await;
    assert!(matches!(empty, Err(ReaderError::Validation(_))));

    let ok = session
        .create_annotation(
            &client,
            VerseId(7),
            AnnotationKind::Note,
            None,
            Some("Permanecer em Cristo".into()),
        )
        .await;
    assert!(ok.is_ok());
    assert_eq!(session.annotations.notes_for(VerseId(7)), vec!["Permanecer em Cristo"]);
}

#[tokio::test]
async fn test_delete_unknown_and_failed_delete() {
    let client = FakeContent {
        fail_delete: true,
        ..Default::default()
    };
    let mut session = session_with_books(&client).await;
    let ticket = session.select_book_by_id(BookId(1)).unwrap();
    session.load(&client, ticket).await;

    assert_eq!(
        session.delete_annotation(&client, AnnotationId(77)).await,
        Err(ReaderError::NotFound(NotFoundTarget::Annotation(AnnotationId(77))))
    );
    assert!(!client.calls().contains(&Call::Delete(AnnotationId(77))));

    let created = session
        .create_annotation(&client, VerseId(101), AnnotationKind::Bookmark, None, None)
        .await
        .unwrap();
    let outcome = session.delete_annotation(&client, created.id).await;

    assert!(matches!(outcome, Err(ReaderError::Network(_))));
    assert!(session.annotations.get(created.id).is_some());
    assert!(session.status_message.is_some());
}

#[tokio::test]
async fn test_delete_removes_locally_and_remotely() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    let created = session
        .create_annotation(&client, VerseId(1), AnnotationKind::Bookmark, None, None)
        .await
        .unwrap();
    session.delete_annotation(&client, created.id).await.unwrap();

    assert!(session.annotations.is_empty());
    assert!(client.calls().contains(&Call::Delete(created.id)));
}

#[tokio::test]
async fn test_rejected_update_leaves_local_copy() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;
    let created = session
        .create_annotation(&client, VerseId(3), AnnotationKind::Note, None, Some("before".into()))
        .await
        .unwrap();

    let blank = session
        .update_annotation(&client, created.id, &AnnotationPatch::note(""))
        .await;
    assert!(matches!(blank, Err(ReaderError::Validation(_))));
    assert!(!client.calls().contains(&Call::Update(created.id)));

    let rejected = session
        .update_annotation(&client, created.id, &AnnotationPatch::note("after"))
        .await;
    assert_eq!(rejected, Err(ReaderError::Api("Annotation not found".into())));
    assert_eq!(session.annotations.notes_for(VerseId(3)), vec!["before"]);
}

#[tokio::test]
async fn test_short_search_skips_client() {
    let client = FakeContent::default();
    let mut session = session_with_books(&client).await;

    assert!(!session.quick_search(&client, "J").await);
    assert!(!client.calls().iter().any(|c| matches!(c, Call::Search(_))));

    assert!(session.quick_search(&client, "John 3:16").await);
    assert!(client.calls().contains(&Call::Search("John 3:16".into())));
}

#[test]
fn test_stale_search_is_discarded() {
    let mut session = desktop_session();
    let first = session.search_input("light").unwrap();
    let second = session.search_input("lights").unwrap();

    assert!(session.apply_search(second.seq, Ok(QuickSearchResult::Text { verses: Vec::new() })));
    assert!(!session.apply_search(first.seq, Ok(QuickSearchResult::Text { verses: Vec::new() })));

    // Shrinking below the minimum also invalidates what is in flight
    let third = session.search_input("li").unwrap();
    assert_eq!(session.search_input("l"), None);
    assert!(!session.apply_search(third.seq, Ok(QuickSearchResult::Text { verses: Vec::new() })));
}

#[test]
fn test_search_hit_focuses_verse_after_load() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));

    let unknown = SearchHit {
        book_id: BookId(999),
        chapter: 1,
        verse: None,
        label: "Nowhere 1".into(),
        snippet: String::new(),
    };
    assert_eq!(
        session.open_search_hit(&unknown),
        Err(ReaderError::NotFound(NotFoundTarget::Book(BookId(999))))
    );

    let hit = SearchHit {
        book_id: BookId(43),
        chapter: 3,
        verse: Some(4),
        label: "John 3:4".into(),
        snippet: String::new(),
    };
    let ticket = session.open_search_hit(&hit).unwrap().unwrap();
    assert_eq!(session.focused_verse, None);

    session.apply_load(loaded(ticket));
    assert_eq!(session.focused_verse, Some(4));

    // Already on John 3: focus applies at once, no reload
    let again = SearchHit {
        verse: Some(2),
        ..hit
    };
    assert_eq!(session.open_search_hit(&again).unwrap(), None);
    assert_eq!(session.focused_verse, Some(2));
}

#[test]
fn test_mobile_book_selection_closes_sidebar() {
    let mut session = ReadingSession::new(
        &Size {
            width: 500,
            height: 900,
        },
        GestureConfig::default(),
    );
    session.apply_books(Ok(books()));
    session.panels.toggle_sidebar();
    assert!(session.panels.sidebar_open());

    session.select_book_by_id(BookId(1)).unwrap();
    assert!(!session.panels.sidebar_open());
}

#[test]
fn test_created_annotation_for_other_chapter_is_not_shown() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));
    let ticket = session.select_book_by_id(BookId(1)).unwrap();
    session.apply_load(loaded(ticket));

    let new = NewAnnotation::new(VerseId(101), AnnotationKind::Bookmark, None, None).unwrap();
    let here = Annotation::from_new(AnnotationId(1), new, Utc::now());
    assert!(session.annotation_created(Ok(here)).is_some());

    let new = NewAnnotation::new(VerseId(9999), AnnotationKind::Bookmark, None, None).unwrap();
    let elsewhere = Annotation::from_new(AnnotationId(2), new, Utc::now());
    assert!(session.annotation_created(Ok(elsewhere)).is_none());
    assert_eq!(session.annotations.len(), 1);
}

#[test]
fn test_failed_delete_after_leaving_chapter_is_not_restored() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));
    let ticket = session.select_book_by_id(BookId(1)).unwrap();
    session.apply_load(loaded(ticket));

    let new = NewAnnotation::new(VerseId(101), AnnotationKind::Bookmark, None, None).unwrap();
    let bookmark = Annotation::from_new(AnnotationId(5), new, Utc::now());
    session.annotation_created(Ok(bookmark));
    let removed = session.begin_delete(AnnotationId(5)).unwrap();

    // DELETE still in flight while the reader moves on to chapter 2
    let next = session.change_chapter(Direction::Next).unwrap();
    session.apply_load(loaded(next));
    session.annotation_deleted(removed, Err(ReaderError::Network("timed out".into())));

    assert!(session.annotations.is_empty());
    assert_eq!(session.annotations.stats().total, 0);
    assert!(session.status_message.is_some());
}

#[test]
fn test_jump_while_loading_keeps_verse_focus() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));
    let john = books().into_iter().find(|b| b.id == BookId(43)).unwrap();

    let first = session.jump_to_reference(john.clone(), 3, None).unwrap();
    let second = session.jump_to_reference(john, 3, Some(16)).unwrap();
    assert_eq!((second.book_id, second.chapter), (BookId(43), 3));

    assert!(!session.apply_load(loaded(first)));
    assert!(session.apply_load(loaded(second)));
    assert_eq!(session.focused_verse, Some(16));
}

#[test]
fn test_jump_to_failed_chapter_reloads() {
    let mut session = desktop_session();
    session.apply_books(Ok(books()));
    let john = books().into_iter().find(|b| b.id == BookId(43)).unwrap();

    let ticket = session.jump_to_reference(john.clone(), 3, None).unwrap();
    session.apply_load(ReadingLoad {
        ticket,
        chapter: Err(ReaderError::Network("down".into())),
        annotations: Ok(Vec::new()),
    });
    assert!(matches!(session.content, ContentState::Failed { .. }));

    let retry = session.jump_to_reference(john, 3, Some(16)).unwrap();
    assert_eq!(
        session.content,
        ContentState::Loading {
            book_id: BookId(43),
            chapter: 3
        }
    );
    session.apply_load(loaded(retry));
    assert_eq!(session.chapter().map(|c| c.number), Some(3));
    assert_eq!(session.focused_verse, Some(16));
}
