use tracing::debug;

use crate::error::ReaderError;
use crate::model::{Book, BookId};

/// Direction for chapter stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// A content reload the caller must perform. Carries the sequence number the
/// result has to be tagged with when handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    pub seq: u64,
    pub book_id: BookId,
    pub chapter: u32,
}

/// Which book and chapter are on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    selected_book: Option<Book>,
    selected_chapter: u32,
    total_chapters: u32,
    /// Verse to scroll to once the pending reload lands
    pending_focus: Option<u32>,
    next_seq: u64,
    latest_seq: Option<u64>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            selected_chapter: 1,
            ..Default::default()
        }
    }

    pub fn selected_book(&self) -> Option<&Book> {
        self.selected_book.as_ref()
    }

    pub fn selected_chapter(&self) -> u32 {
        self.selected_chapter
    }

    /// Upper chapter bound for the selected book
    pub fn total_chapters(&self) -> u32 {
        self.total_chapters.max(1)
    }

    pub fn latest_seq(&self) -> Option<u64> {
        self.latest_seq
    }

    pub fn pending_focus(&self) -> Option<u32> {
        self.pending_focus
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest_seq == Some(seq)
    }

    pub fn can_step(&self, direction: Direction) -> bool {
        self.selected_book.is_some() && self.step_target(direction).is_ok()
    }

    /// Select a book and reset to its first chapter. Always reloads.
    pub fn select_book(&mut self, book: Book) -> ReloadTicket {
        self.total_chapters = book.last_chapter();
        self.selected_book = Some(book);
        self.selected_chapter = 1;
        self.pending_focus = None;
        self.issue()
    }

    /// Step one chapter. Stepping past either end is a silent no-op.
    pub fn change_chapter(&mut self, direction: Direction) -> Option<ReloadTicket> {
        self.selected_book.as_ref()?;
        match self.step_target(direction) {
            Ok(chapter) => {
                self.selected_chapter = chapter;
                self.pending_focus = None;
                Some(self.issue())
            }
            Err(err) => {
                debug!(%err, "chapter step ignored");
                None
            }
        }
    }

    /// Jump straight to a reference, bypassing the one-step rule.
    ///
    /// The chapter is clamped into the book's range. `displayed` is the
    /// (book, chapter) currently on screen, if any. Returns `None` only when
    /// that is the target; the verse focus then applies immediately. A
    /// target that is selected but still loading or failed gets a new ticket.
    pub fn jump_to_reference(
        &mut self,
        book: Book,
        chapter: u32,
        verse: Option<u32>,
        displayed: Option<(BookId, u32)>,
    ) -> Option<ReloadTicket> {
        let chapter = book.clamp_chapter(chapter);
        let unchanged = displayed == Some((book.id, chapter))
            && self.selected_book.as_ref().map(|b| b.id) == Some(book.id)
            && self.selected_chapter == chapter;

        self.total_chapters = book.last_chapter();
        self.selected_book = Some(book);
        self.selected_chapter = chapter;
        self.pending_focus = verse;

        if unchanged {
            None
        } else {
            Some(self.issue())
        }
    }

    /// Re-issue a ticket for the current position (after a failed load)
    pub fn reload(&mut self) -> Option<ReloadTicket> {
        self.selected_book.as_ref()?;
        Some(self.issue())
    }

    /// Adopt the bound reported by a loaded chapter. Never drops below the
    /// chapter currently shown, never exceeds the book's `chapters_count`.
    pub fn set_total_chapters(&mut self, total: u32) {
        if total == 0 {
            return;
        }
        let capped = match &self.selected_book {
            Some(book) => total.min(book.last_chapter()),
            None => total,
        };
        self.total_chapters = capped.max(self.selected_chapter);
    }

    pub fn take_focus(&mut self) -> Option<u32> {
        self.pending_focus.take()
    }

    fn step_target(&self, direction: Direction) -> Result<u32, ReaderError> {
        let candidate = match direction {
            Direction::Prev => i64::from(self.selected_chapter) - 1,
            Direction::Next => i64::from(self.selected_chapter) + 1,
        };
        let last = self.total_chapters();
        if (1..=i64::from(last)).contains(&candidate) {
            Ok(candidate as u32)
        } else {
            Err(ReaderError::Boundary {
                requested: candidate,
                last,
            })
        }
    }

    fn issue(&mut self) -> ReloadTicket {
        self.next_seq += 1;
        self.latest_seq = Some(self.next_seq);
        ReloadTicket {
            seq: self.next_seq,
            // Only called with a book selected
            book_id: self.selected_book.as_ref().map(|b| b.id).unwrap_or(BookId(0)),
            chapter: self.selected_chapter,
        }
    }
}
