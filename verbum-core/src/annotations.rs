use std::collections::HashSet;

use tracing::debug;

use crate::error::{NotFoundTarget, ReaderError, Result};
use crate::model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, HighlightColor, NewAnnotation,
    VerseId,
};

/// Annotation counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationStats {
    pub total: usize,
    pub highlights: usize,
    pub notes: usize,
    pub bookmarks: usize,
}

/// In-memory annotations for the active reading context.
///
/// Rendering code reads through `&AnnotationStore`; every write goes through
/// the methods below.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the server's annotations, keeping only those
    /// attached to `verses` (the loaded chapter).
    pub fn load(&mut self, annotations: Vec<Annotation>, verses: &HashSet<VerseId>) {
        let received = annotations.len();
        self.annotations = annotations
            .into_iter()
            .filter(|a| verses.contains(&a.verse_id))
            .collect();
        debug!(
            received,
            kept = self.annotations.len(),
            "annotations loaded"
        );
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Every annotation on a verse, in insertion order
    pub fn annotations_for(&self, verse_id: VerseId) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.verse_id == verse_id)
            .collect()
    }

    /// Background color: the first highlight found for the verse
    pub fn highlight_for(&self, verse_id: VerseId) -> Option<HighlightColor> {
        self.annotations
            .iter()
            .filter(|a| a.verse_id == verse_id && a.kind == AnnotationKind::Highlight)
            .find_map(|a| a.color)
    }

    /// Note texts for a verse; every note renders its own indicator
    pub fn notes_for(&self, verse_id: VerseId) -> Vec<&str> {
        self.annotations
            .iter()
            .filter(|a| a.verse_id == verse_id && a.kind == AnnotationKind::Note)
            .filter_map(Annotation::note)
            .collect()
    }

    pub fn is_bookmarked(&self, verse_id: VerseId) -> bool {
        self.annotations
            .iter()
            .any(|a| a.verse_id == verse_id && a.kind == AnnotationKind::Bookmark)
    }

    /// Validate a creation request; the confirmed annotation is added with
    /// [`AnnotationStore::insert`] once the backend has assigned an id.
    pub fn prepare(
        &self,
        verse_id: VerseId,
        kind: AnnotationKind,
        color: Option<HighlightColor>,
        note_text: Option<String>,
    ) -> Result<NewAnnotation> {
        NewAnnotation::new(verse_id, kind, color, note_text)
    }

    /// Add a confirmed annotation, replacing any local copy with the same id
    pub fn insert(&mut self, annotation: Annotation) {
        match self.annotations.iter_mut().find(|a| a.id == annotation.id) {
            Some(existing) => *existing = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Check a patch against the local copy without applying it
    pub fn preview_update(&self, id: AnnotationId, patch: &AnnotationPatch) -> Result<Annotation> {
        let current = self
            .get(id)
            .ok_or(ReaderError::NotFound(NotFoundTarget::Annotation(id)))?;
        patch.applied_to(current)
    }

    /// Remove locally. Unknown ids fail with `NotFound`.
    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation> {
        let pos = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(ReaderError::NotFound(NotFoundTarget::Annotation(id)))?;
        Ok(self.annotations.remove(pos))
    }

    /// Annotation-panel listing, newest first
    pub fn filter(&self, term: &str, kind: Option<AnnotationKind>) -> Vec<&Annotation> {
        let mut matching: Vec<_> = self
            .annotations
            .iter()
            .filter(|a| kind.map_or(true, |k| a.kind == k))
            .filter(|a| a.matches(term))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    pub fn stats(&self) -> AnnotationStats {
        self.annotations
            .iter()
            .fold(AnnotationStats::default(), |mut stats, a| {
                stats.total += 1;
                match a.kind {
                    AnnotationKind::Highlight => stats.highlights += 1,
                    AnnotationKind::Note => stats.notes += 1,
                    AnnotationKind::Bookmark => stats.bookmarks += 1,
                }
                stats
            })
    }
}
