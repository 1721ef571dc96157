pub mod annotation;
pub mod book;
pub mod chapter;
pub mod search;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, HighlightColor, NewAnnotation,
};
pub use book::{Book, BookId, Library, Testament};
pub use chapter::{BookRef, Chapter, ChapterPayload, Verse, VerseId};
pub use search::{QuickQuery, QuickSearchResult, SearchHit};
