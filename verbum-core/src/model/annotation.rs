use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::chapter::VerseId;
use crate::error::{ReaderError, Result};

/// Backend identifier of an annotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Annotation kind; determines which fields are required
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Note,
    Bookmark,
}

impl AnnotationKind {
    pub fn all() -> &'static [AnnotationKind] {
        &[
            AnnotationKind::Highlight,
            AnnotationKind::Note,
            AnnotationKind::Bookmark,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "Highlight",
            AnnotationKind::Note => "Note",
            AnnotationKind::Bookmark => "Bookmark",
        }
    }
}

/// The fixed highlight palette
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum HighlightColor {
    Amber,
    Green,
    Blue,
    Pink,
    Orange,
    Purple,
}

impl HighlightColor {
    pub fn all() -> &'static [HighlightColor] {
        &[
            HighlightColor::Amber,
            HighlightColor::Green,
            HighlightColor::Blue,
            HighlightColor::Pink,
            HighlightColor::Orange,
            HighlightColor::Purple,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            HighlightColor::Amber => "amber",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
            HighlightColor::Purple => "purple",
        }
    }

    /// Hex value stored by the backend
    pub fn hex(&self) -> &'static str {
        match self {
            HighlightColor::Amber => "#FFF3CD",
            HighlightColor::Green => "#D4EDDA",
            HighlightColor::Blue => "#CCE5FF",
            HighlightColor::Pink => "#F8D7DA",
            HighlightColor::Orange => "#FFE4B5",
            HighlightColor::Purple => "#E2D9F3",
        }
    }

    /// Reading category shown in the color legend
    pub fn label(&self) -> &'static str {
        match self {
            HighlightColor::Amber => "Important",
            HighlightColor::Green => "Promise",
            HighlightColor::Blue => "Command",
            HighlightColor::Pink => "Warning",
            HighlightColor::Orange => "Reflection",
            HighlightColor::Purple => "Prayer",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Parse a palette name or hex value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all().iter().copied().find(|c| {
            c.name().eq_ignore_ascii_case(value) || c.hex().eq_ignore_ascii_case(value)
        })
    }
}

impl std::str::FromStr for HighlightColor {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            ReaderError::validation(format!("color {s:?} is not in the highlight palette"))
        })
    }
}

impl TryFrom<String> for HighlightColor {
    type Error = ReaderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HighlightColor> for String {
    fn from(color: HighlightColor) -> Self {
        color.hex().to_string()
    }
}

/// An annotation attached to a verse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub verse_id: VerseId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: Option<HighlightColor>,
    #[serde(default)]
    pub note_text: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_text: Option<String>,
}

impl Annotation {
    /// Build a confirmed annotation from a validated request
    pub fn from_new(id: AnnotationId, new: NewAnnotation, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            verse_id: new.verse_id,
            kind: new.kind,
            color: new.color,
            note_text: new.note_text,
            created_at,
            updated_at: None,
            verse_reference: None,
            verse_text: None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        self.note_text.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Case-insensitive match against reference, verse text and note
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            self.verse_reference.as_deref(),
            self.verse_text.as_deref(),
            self.note_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

/// A validated creation request (`POST /api/annotations`)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewAnnotation {
    pub verse_id: VerseId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
}

impl NewAnnotation {
    /// Validate the fields required by `kind`.
    ///
    /// Highlights need a palette color, notes need non-empty text, bookmarks
    /// need neither.
    pub fn new(
        verse_id: VerseId,
        kind: AnnotationKind,
        color: Option<HighlightColor>,
        note_text: Option<String>,
    ) -> Result<Self> {
        let note_text = note_text.filter(|n| !n.trim().is_empty());
        validate_fields(kind, color, note_text.as_deref())?;
        Ok(Self {
            verse_id,
            kind,
            color,
            note_text,
        })
    }
}

/// Partial edit (`PUT /api/annotations/{id}`)
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AnnotationPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnnotationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
}

impl AnnotationPatch {
    pub fn recolor(color: HighlightColor) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self {
            note_text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Apply to a copy of `annotation`, re-checking the kind rules
    pub fn applied_to(&self, annotation: &Annotation) -> Result<Annotation> {
        let mut patched = annotation.clone();
        if let Some(kind) = self.kind {
            patched.kind = kind;
        }
        if let Some(color) = self.color {
            patched.color = Some(color);
        }
        if let Some(note) = &self.note_text {
            patched.note_text = Some(note.clone()).filter(|n| !n.trim().is_empty());
        }
        validate_fields(patched.kind, patched.color, patched.note_text.as_deref())?;
        Ok(patched)
    }
}

fn validate_fields(
    kind: AnnotationKind,
    color: Option<HighlightColor>,
    note_text: Option<&str>,
) -> Result<()> {
    match kind {
        AnnotationKind::Highlight if color.is_none() => {
            Err(ReaderError::validation("a highlight needs a color"))
        }
        AnnotationKind::Note if note_text.map_or(true, |n| n.trim().is_empty()) => {
            Err(ReaderError::validation("a note needs text"))
        }
        _ => Ok(()),
    }
}

/// Colors outside the palette (older data) render as unhighlighted
fn lenient_color<'de, D>(deserializer: D) -> std::result::Result<Option<HighlightColor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(HighlightColor::parse))
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 in UTC
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            Ok(raw.as_deref().and_then(super::parse))
        }
    }
}
