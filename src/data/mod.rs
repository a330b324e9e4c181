//! Metadata records held in the by-id cache
//!
//! These types mirror what a metadata service returns for a single title.
//! Only the fields worth keeping between runs are modeled.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a title in the metadata service
pub type MetadataId = i64;

/// Title in each of the languages the service tracks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    /// Romanized title
    pub romaji: Option<String>,
    /// English title
    pub english: Option<String>,
    /// Title in the original script
    pub native: Option<String>,
}

/// Publication state of a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationStatus {
    Finished,
    Releasing,
    NotYetReleased,
    Cancelled,
    Hiatus,
}

/// Cover art at the sizes the service offers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
    /// Average color as a hex string, e.g. `#e4a143`
    pub color: Option<String>,
}

/// A full metadata record for one title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Service identifier
    pub id: MetadataId,
    /// Titles in each language
    pub title: Titles,
    /// Alternative names
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Plain-text synopsis
    pub description: Option<String>,
    /// Publication state
    pub status: Option<PublicationStatus>,
    /// Number of chapters, once known
    pub chapters: Option<u32>,
    /// Number of volumes, once known
    pub volumes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Mean user score (0-100)
    pub average_score: Option<u8>,
    #[serde(default)]
    pub cover_image: CoverImage,
    /// Page of the title on the service
    pub site_url: Option<String>,
}

impl MetadataRecord {
    /// Creates a record with only an id and a romanized title
    pub fn new(id: MetadataId, romaji: impl Into<String>) -> Self {
        Self {
            id,
            title: Titles {
                romaji: Some(romaji.into()),
                ..Titles::default()
            },
            synonyms: Vec::new(),
            description: None,
            status: None,
            chapters: None,
            volumes: None,
            genres: Vec::new(),
            tags: Vec::new(),
            average_score: None,
            cover_image: CoverImage::default(),
            site_url: None,
        }
    }

    /// Best display name: English, then romaji, then native
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .english
            .as_deref()
            .or(self.title.romaji.as_deref())
            .or(self.title.native.as_deref())
    }

    /// Every name this title is known by
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [
            self.title.english.as_deref(),
            self.title.romaji.as_deref(),
            self.title.native.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(self.synonyms.iter().map(String::as_str))
    }
}
