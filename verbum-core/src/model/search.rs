use serde::{Deserialize, Serialize};

use super::book::BookId;
use super::chapter::{BookRef, VerseId};

/// Shortest query sent to the quick-search endpoint
pub const MIN_QUERY_CHARS: usize = 2;

/// Text search results shown in the dropdown
pub const MAX_TEXT_HITS: usize = 5;

/// A quick-search query long enough to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickQuery(String);

impl QuickQuery {
    /// Returns `None` for input that should short-circuit client-side
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Verse of a reference-pattern result ("John 3:16")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceVerse {
    pub id: VerseId,
    #[serde(alias = "number")]
    pub verse_num: u32,
    pub text: String,
}

/// Verse of a free-text result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextHit {
    pub id: VerseId,
    pub book: BookRef,
    #[serde(alias = "chapter_number")]
    pub chapter_num: u32,
    #[serde(alias = "number")]
    pub verse_num: u32,
    pub text: String,
    #[serde(default)]
    pub reference: Option<String>,
}

/// `data` of `GET /api/search/quick`, told apart by shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum QuickSearchResult {
    Reference {
        book: BookRef,
        chapter: u32,
        verses: Vec<ReferenceVerse>,
    },
    Text {
        verses: Vec<TextHit>,
    },
}

/// A selectable search result, resolved to a navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub book_id: BookId,
    pub chapter: u32,
    pub verse: Option<u32>,
    pub label: String,
    pub snippet: String,
}

impl QuickSearchResult {
    pub fn hits(&self) -> Vec<SearchHit> {
        match self {
            QuickSearchResult::Reference {
                book,
                chapter,
                verses,
            } => verses
                .iter()
                .map(|v| SearchHit {
                    book_id: book.id,
                    chapter: *chapter,
                    verse: Some(v.verse_num),
                    label: format!("{} {}:{}", book.name, chapter, v.verse_num),
                    snippet: v.text.clone(),
                })
                .collect(),
            QuickSearchResult::Text { verses } => verses
                .iter()
                .take(MAX_TEXT_HITS)
                .map(|v| SearchHit {
                    book_id: v.book.id,
                    chapter: v.chapter_num,
                    verse: Some(v.verse_num),
                    label: v.reference.clone().unwrap_or_else(|| {
                        format!("{} {}:{}", v.book.name, v.chapter_num, v.verse_num)
                    }),
                    snippet: v.text.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_queries_short_circuit() {
        assert!(QuickQuery::parse("").is_none());
        assert!(QuickQuery::parse(" J ").is_none());
        assert_eq!(QuickQuery::parse(" Jo ").unwrap().as_str(), "Jo");
    }

    #[test]
    fn test_reference_shape() {
        let json = r#"{"book": {"id": 43, "name": "John", "abbreviation": "Jo", "testament": "new"},
                       "chapter": 3,
                       "verses": [{"id": 900, "verse_num": 16, "text": "For God so loved"}]}"#;
        let result: QuickSearchResult = serde_json::from_str(json).unwrap();
        assert!(matches!(result, QuickSearchResult::Reference { chapter: 3, .. }));

        let hits = result.hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "John 3:16");
        assert_eq!(hits[0].verse, Some(16));
    }

    #[test]
    fn test_text_shape_is_capped() {
        let verse = |n: u32| {
            serde_json::json!({
                "id": n, "book": {"id": 19, "name": "Psalms"},
                "chapter_num": 23, "verse_num": n, "text": "The Lord is my shepherd"
            })
        };
        let json = serde_json::json!({ "verses": (1..=8).map(verse).collect::<Vec<_>>(), "total": 8 });
        let result: QuickSearchResult = serde_json::from_value(json).unwrap();

        let hits = result.hits();
        assert_eq!(hits.len(), MAX_TEXT_HITS);
        assert_eq!(hits[0].book_id, BookId(19));
        assert_eq!(hits[0].label, "Psalms 23:1");
    }
}
