//! Domain records: research entries, corrections, and social statistics.
//!
//! Stored shapes use camelCase field names and snake_case enum tokens so the
//! serialized form matches what the remote document store holds.

use crate::{ParseError, Record, RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident / $kind:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
        }

        impl $name {
            /// The serialized token for this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => Err(ParseError::new($kind, other)),
                }
            }
        }
    };
}

string_enum! {
    /// Where a piece of content was published.
    Platform / "platform" {
        Youtube => "youtube",
        Facebook => "facebook",
        Instagram => "instagram",
        Tiktok => "tiktok",
    }
}

string_enum! {
    /// The format of a piece of content.
    ContentType / "content type" {
        Video => "video",
        Reel => "reel",
        Post => "post",
    }
}

string_enum! {
    /// What kind of reference a source is.
    SourceKind / "source kind" {
        Article => "article",
        ResearchPaper => "research_paper",
        Website => "website",
        Book => "book",
        Video => "video",
        Other => "other",
    }
}

string_enum! {
    /// How trustworthy a source is judged to be.
    Credibility / "credibility" {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

string_enum! {
    /// How serious a published mistake was.
    Severity / "severity" {
        Minor => "minor",
        Moderate => "moderate",
        Major => "major",
    }
}

string_enum! {
    /// Where a correction stands.
    CorrectionStatus / "correction status" {
        Pending => "pending",
        Corrected => "corrected",
        Acknowledged => "acknowledged",
    }
}

/// One cited source backing a piece of content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Identifier unique within the owning entry.
    pub id: String,
    /// Human-readable source title.
    pub title: String,
    /// Where the source lives.
    pub url: String,
    /// What kind of reference this is.
    pub kind: SourceKind,
    /// Credibility judgment.
    pub credibility: Credibility,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Source citations for one published piece of content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchEntry {
    /// Record identifier.
    pub id: RecordId,
    /// The creator's running content number.
    pub content_number: u32,
    /// Content title.
    pub title: String,
    /// Where the content was published.
    pub platform: Platform,
    /// The content format.
    pub content_type: ContentType,
    /// Cited sources.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Publication date, free-form.
    #[serde(default)]
    pub upload_date: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Topic tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp, stamped by the sync layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl ResearchEntry {
    /// A new entry with a provisional id and the required fields set.
    pub fn new(
        content_number: u32,
        title: impl Into<String>,
        platform: Platform,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: RecordId::provisional(),
            content_number,
            title: title.into(),
            platform,
            content_type,
            sources: Vec::new(),
            upload_date: String::new(),
            description: None,
            tags: Vec::new(),
            created_at: None,
        }
    }
}

impl Record for ResearchEntry {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }
}

/// A public erratum for one published piece of content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    /// Record identifier.
    pub id: RecordId,
    /// The creator's running content number.
    pub content_number: u32,
    /// Content title.
    pub title: String,
    /// Where the content was published.
    pub platform: Platform,
    /// What was wrong.
    pub mistake_description: String,
    /// The corrected statement.
    pub correction: String,
    /// When the correction was issued, free-form.
    #[serde(default)]
    pub correction_date: String,
    /// How serious the mistake was.
    pub severity: Severity,
    /// Where the correction stands.
    pub status: CorrectionStatus,
    /// Creation timestamp, stamped by the sync layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Correction {
    /// A new pending correction with a provisional id.
    pub fn new(
        content_number: u32,
        title: impl Into<String>,
        platform: Platform,
        mistake_description: impl Into<String>,
        correction: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: RecordId::provisional(),
            content_number,
            title: title.into(),
            platform,
            mistake_description: mistake_description.into(),
            correction: correction.into(),
            correction_date: String::new(),
            severity,
            status: CorrectionStatus::Pending,
            created_at: None,
        }
    }
}

impl Record for Correction {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }
}

/// The social-statistics document shown on the public site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialStats {
    /// Published video count.
    #[serde(default)]
    pub videos: u64,
    /// Follower count across platforms.
    #[serde(default)]
    pub followers: u64,
    /// Total view count.
    #[serde(default)]
    pub views: u64,
    /// Total like count.
    #[serde(default)]
    pub likes: u64,
    /// When the numbers were last edited, free-form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
