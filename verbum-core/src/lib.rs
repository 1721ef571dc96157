//! Verbum Core - Platform-agnostic scripture reader state
//!
//! This crate holds the data model, the reading-session state machine and
//! the content-client seam for the Verbum reader. It performs no I/O of its
//! own: front ends drive the session and perform the fetches it asks for.

pub mod annotations;
pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod navigation;
pub mod panels;
pub mod selection;
pub mod session;

pub use annotations::{AnnotationStats, AnnotationStore};
pub use app::{App, Effect, Focus, Mode};
pub use config::{ConfigError, ReaderConfig};
pub use content::{fetch_reading, AnnotationScope, ContentClient, ReadingLoad};
pub use error::{NotFoundTarget, ReaderError, Result};
pub use model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, Book, BookId, Chapter,
    HighlightColor, Library, NewAnnotation, QuickQuery, QuickSearchResult, SearchHit, Testament,
    Verse, VerseId,
};
pub use navigation::{Direction, NavigationState, ReloadTicket};
pub use panels::{GestureConfig, PanelState, Point, Size, ViewportClass, ViewportObserver};
pub use selection::{AnnotationMenu, MenuOption, SelectionMachine, SelectionState};
pub use session::{ContentState, LibraryState, ReadingSession, SearchTicket};
