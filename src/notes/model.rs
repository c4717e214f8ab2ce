//! Note data model.
//!
//! A `Note` is the persisted unit of work: text plus display state, last
//! known window geometry, pin flag, and the soft-close bookkeeping. The
//! invariant worth remembering: `closed_at` is `Some` exactly when
//! `is_closed` is true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimum usable note window size, exported for the shell.
pub const MIN_NOTE_WIDTH: f64 = 220.0;
pub const MIN_NOTE_HEIGHT: f64 = 180.0;

/// Opaque note identifier, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    pub fn new() -> Self {
        NoteId(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(NoteId)
    }

    /// First eight hex digits, for compact display.
    pub fn short(&self) -> String {
        let mut buf = Uuid::encode_buffer();
        self.0.simple().encode_lower(&mut buf)[..8].to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        NoteId::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display state of a note. Purely descriptive - it drives nothing but
/// how the shell renders the note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteState {
    #[default]
    Normal,
    Todo,
    InProgress,
    Done,
}

impl NoteState {
    pub const ALL: [NoteState; 4] = [
        NoteState::Normal,
        NoteState::Todo,
        NoteState::InProgress,
        NoteState::Done,
    ];

    /// Human-readable name for state pickers.
    pub fn label(&self) -> &'static str {
        match self {
            NoteState::Normal => "Normal",
            NoteState::Todo => "Todo",
            NoteState::InProgress => "In Progress",
            NoteState::Done => "Done",
        }
    }
}

/// On-screen geometry of a note window, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for NoteFrame {
    fn default() -> Self {
        // Screen-independent fallback; centering needs display metrics,
        // which belong to the shell.
        NoteFrame {
            x: 180.0,
            y: 180.0,
            width: 340.0,
            height: 280.0,
        }
    }
}

impl NoteFrame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        NoteFrame {
            x,
            y,
            width,
            height,
        }
    }

    /// Degenerate or non-finite geometry cannot host a window.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// A persisted sticky note record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub state: NoteState,
    pub frame: NoteFrame,
    pub is_pinned: bool,
    pub is_closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Note {
    /// A fresh, active note with default field values.
    pub fn new(id: NoteId) -> Self {
        Note {
            id,
            text: String::new(),
            state: NoteState::Normal,
            frame: NoteFrame::default(),
            is_pinned: false,
            is_closed: false,
            closed_at: None,
        }
    }

    /// Title for menu items: first non-empty line of the text, trimmed,
    /// or a short id-based placeholder for blank notes.
    pub fn display_title(&self) -> String {
        self.text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Note {}", self.id.short()))
    }
}
