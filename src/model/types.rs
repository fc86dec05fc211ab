//! Core type definitions for the application

use serde::{Deserialize, Serialize};

/// A playable item. Immutable once fetched from the catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u32,
    /// Stream locator handed to the audio sink
    pub locator: String,
}

impl Track {
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// A DJ radio station
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Radio {
    pub id: u64,
    pub name: String,
    pub host: String,
}

/// A user's playlist (for menu display)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistRef {
    pub id: u64,
    pub name: String,
    pub track_count: u32,
}

/// Signed-in account restored from the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub nickname: String,
}

/// One visible row of a menu
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub title: String,
    pub subtitle: Option<String>,
}

impl MenuItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), subtitle: None }
    }

    pub fn with_subtitle(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: Some(subtitle.into()),
        }
    }
}

/// Play mode state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    ListLoop,
    Ordered,
    SingleLoop,
    Random,
    IntelligentFm,
}

impl PlayMode {
    /// Next mode for the user's cycle command. FM is never reached this way.
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::ListLoop => PlayMode::Ordered,
            PlayMode::Ordered => PlayMode::SingleLoop,
            PlayMode::SingleLoop => PlayMode::Random,
            PlayMode::Random => PlayMode::ListLoop,
            PlayMode::IntelligentFm => PlayMode::ListLoop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::ListLoop => "List Loop",
            PlayMode::Ordered => "Ordered",
            PlayMode::SingleLoop => "Single Loop",
            PlayMode::Random => "Random",
            PlayMode::IntelligentFm => "Intelligent FM",
        }
    }
}

/// Which view currently receives mode-specific input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Menu,
    Playing,
}

impl UiMode {
    pub fn toggle(self) -> Self {
        match self {
            UiMode::Menu => UiMode::Playing,
            UiMode::Playing => UiMode::Menu,
        }
    }
}
