use serde::{Deserialize, Serialize};

/// Backend identifier of a book
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct BookId(pub u32);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Testament grouping used by the navigation sidebar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    #[serde(alias = "Old Testament", alias = "Antigo Testamento")]
    Old,
    #[serde(alias = "New Testament", alias = "Novo Testamento")]
    New,
}

impl Testament {
    pub fn all() -> &'static [Testament] {
        &[Testament::Old, Testament::New]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "Old Testament",
            Testament::New => "New Testament",
        }
    }
}

/// A book of the Bible. Reference data owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub testament: Testament,
    pub chapters_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl Book {
    pub fn new(id: u32, name: impl Into<String>, testament: Testament, chapters_count: u32) -> Self {
        Self {
            id: BookId(id),
            name: name.into(),
            testament,
            chapters_count,
            abbreviation: None,
            order: None,
        }
    }

    /// Highest valid chapter number. A book always has at least one chapter.
    pub fn last_chapter(&self) -> u32 {
        self.chapters_count.max(1)
    }

    /// Clamp a chapter number into `1..=last_chapter()`
    pub fn clamp_chapter(&self, chapter: u32) -> u32 {
        chapter.clamp(1, self.last_chapter())
    }
}

/// The ordered book list shown in the sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    books: Vec<Book>,
}

impl Library {
    pub fn new(mut books: Vec<Book>) -> Self {
        // Backend order wins when present; otherwise keep the order received.
        if books.iter().all(|b| b.order.is_some()) {
            books.sort_by_key(|b| b.order);
        }
        Self { books }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Find a book by exact (case-insensitive) name or abbreviation
    pub fn find_by_name(&self, name: &str) -> Option<&Book> {
        let needle = name.trim().to_lowercase();
        self.books.iter().find(|b| {
            b.name.to_lowercase() == needle
                || b
                    .abbreviation
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase() == needle)
        })
    }

    /// A numeric id, else a name or abbreviation
    pub fn resolve(&self, query: &str) -> Option<&Book> {
        match query.trim().parse::<u32>() {
            Ok(id) => self.get(BookId(id)),
            Err(_) => self.find_by_name(query),
        }
    }

    /// Books of one testament whose name contains `term` (case-insensitive)
    pub fn filtered<'a>(&'a self, testament: Testament, term: &str) -> Vec<&'a Book> {
        let term = term.trim().to_lowercase();
        self.books
            .iter()
            .filter(|b| b.testament == testament)
            .filter(|b| term.is_empty() || b.name.to_lowercase().contains(&term))
            .collect()
    }
}
