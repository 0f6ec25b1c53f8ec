//! Type definitions for the notes module.

use chrono::{DateTime, Utc};
use tokio::time::Duration;

/// Scale factor for storing coordinates as fixed-point integers.
pub const COORD_SCALE: f64 = 10_000_000.0;

/// The notes API caps a single response at this many records.
pub const API_MAX_LIMIT: u32 = 10_000;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const RETRY_DELAY: Duration = Duration::from_secs(5);
pub const MAX_RETRIES: usize = 3;

/// Lifecycle state of a note as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    Open,
    Closed,
    Hidden,
}

impl NoteStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(NoteStatus::Open),
            "closed" => Some(NoteStatus::Closed),
            "hidden" => Some(NoteStatus::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Open => "open",
            NoteStatus::Closed => "closed",
            NoteStatus::Hidden => "hidden",
        }
    }
}

/// The action a comment records in the note's discussion thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentEvent {
    Opened,
    Commented,
    Closed,
    Reopened,
    Hidden,
}

impl CommentEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "opened" => Some(CommentEvent::Opened),
            "commented" => Some(CommentEvent::Commented),
            "closed" => Some(CommentEvent::Closed),
            "reopened" => Some(CommentEvent::Reopened),
            "hidden" => Some(CommentEvent::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentEvent::Opened => "opened",
            CommentEvent::Commented => "commented",
            CommentEvent::Closed => "closed",
            CommentEvent::Reopened => "reopened",
            CommentEvent::Hidden => "hidden",
        }
    }
}

/// One entry in a note's discussion thread, ordered as returned
/// upstream. Anonymous comments carry no author.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteComment {
    pub author_uid: Option<i64>,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub event: CommentEvent,
    pub visible: bool,
}

/// A parsed note together with its comment thread. Coordinates are
/// fixed-point degrees x 10^7 so storage and re-ingest comparisons never
/// go through floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub lat_e7: i32,
    pub lon_e7: i32,
    pub tile: i64,
    pub country: Option<String>,
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub is_power_related: bool,
    pub matched_keywords: Vec<String>,
    pub comments: Vec<NoteComment>,
}

impl Note {
    /// The text block classification runs over: every comment body in
    /// thread order. The first comment is the note's description.
    pub fn full_text(&self) -> String {
        self.comments
            .iter()
            .map(|c| c.body.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
