use serde::{Deserialize, Serialize};

use super::book::{Book, BookId, Testament};

/// Stable verse key that annotations attach to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct VerseId(pub u64);

impl std::fmt::Display for VerseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verse {
    pub id: VerseId,
    #[serde(default, alias = "chapter_num")]
    pub chapter_number: u32,
    #[serde(alias = "number")]
    pub verse_num: u32,
    pub text: String,
}

/// A loaded chapter with its ordered verses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub book_id: BookId,
    pub book_name: String,
    pub number: u32,
    /// 0 when neither the payload nor the selected book said
    pub total_chapters: u32,
    pub verses: Vec<Verse>,
}

impl Chapter {
    pub fn verse_by_id(&self, id: VerseId) -> Option<&Verse> {
        self.verses.iter().find(|v| v.id == id)
    }

    /// Position of a verse in display order
    pub fn index_of(&self, verse_num: u32) -> Option<usize> {
        self.verses.iter().position(|v| v.verse_num == verse_num)
    }

    pub fn contains_verse(&self, id: VerseId) -> bool {
        self.verse_by_id(id).is_some()
    }

    /// "John 3:16" style reference for one of this chapter's verses
    pub fn reference(&self, verse: &Verse) -> String {
        format!("{} {}:{}", self.book_name, self.number, verse.verse_num)
    }
}

/// Book summary embedded in chapter and search responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookRef {
    pub id: BookId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testament: Option<Testament>,
}

/// Wire shape of `GET /api/books/{id}/chapters/{n}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPayload {
    pub book: BookRef,
    #[serde(alias = "chapter")]
    pub number: u32,
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub total_chapters: Option<u32>,
}

impl ChapterPayload {
    /// Convert into a [`Chapter`], using `book` for any bound the payload omits
    pub fn into_chapter(self, book: Option<&Book>) -> Chapter {
        let total_chapters = self
            .total_chapters
            .filter(|&n| n > 0)
            .or_else(|| book.map(Book::last_chapter))
            .unwrap_or(0);
        let number = self.number;
        let verses = self
            .verses
            .into_iter()
            .map(|mut v| {
                if v.chapter_number == 0 {
                    v.chapter_number = number;
                }
                v
            })
            .collect();

        Chapter {
            book_id: self.book.id,
            book_name: self.book.name,
            number,
            total_chapters,
            verses,
        }
    }
}
