//! Menu node contract: payload kinds, hooks and their trivial defaults

use serde_json::Value;

use crate::error::RemoteError;
use super::catalogue_client::Query;
use super::types::{MenuItem, PlaylistRef, Radio, Track, User};

/// Result of an asynchronous-capable hook.
///
/// `Fetch` asks the engine to run the query off the event loop and hand the
/// payload back through [`MenuNode::absorb`] before the transition commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hook {
    Continue,
    Abort,
    Fetch(Query),
}

/// Which hook produced a pending fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookStage {
    Enter,
    BottomOut,
    TopOut,
}

/// Engine state visible to hooks
#[derive(Clone, Debug, Default)]
pub struct HookContext {
    pub user: Option<User>,
    pub page_size: usize,
    pub stream_template: String,
}

/// Cached payload of a node. Closed set; each node matches its own kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuData {
    #[default]
    Empty,
    Tracks(Vec<Track>),
    Radios(Vec<Radio>),
    Playlists(Vec<PlaylistRef>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Front,
    Back,
}

impl MenuData {
    pub fn len(&self) -> usize {
        match self {
            MenuData::Empty => 0,
            MenuData::Tracks(t) => t.len(),
            MenuData::Radios(r) => r.len(),
            MenuData::Playlists(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracks(&self) -> &[Track] {
        match self {
            MenuData::Tracks(t) => t,
            _ => &[],
        }
    }

    pub fn views(&self) -> Vec<MenuItem> {
        match self {
            MenuData::Empty => Vec::new(),
            MenuData::Tracks(tracks) => tracks
                .iter()
                .map(|t| MenuItem::with_subtitle(&t.title, t.artist_line()))
                .collect(),
            MenuData::Radios(radios) => radios
                .iter()
                .map(|r| MenuItem::with_subtitle(&r.name, &r.host))
                .collect(),
            MenuData::Playlists(playlists) => playlists
                .iter()
                .map(|p| MenuItem::with_subtitle(&p.name, format!("{} tracks", p.track_count)))
                .collect(),
        }
    }

    /// Grow the cached list at `edge`, never replacing what is there.
    /// Returns how many entries were added; a kind mismatch adds nothing.
    pub fn extend(&mut self, more: MenuData, edge: Edge) -> usize {
        fn splice<T>(list: &mut Vec<T>, mut more: Vec<T>, edge: Edge) -> usize {
            let added = more.len();
            match edge {
                Edge::Back => list.append(&mut more),
                Edge::Front => {
                    more.append(list);
                    *list = more;
                }
            }
            added
        }

        if matches!(self, MenuData::Empty) {
            let added = more.len();
            *self = more;
            return added;
        }

        match (self, more) {
            (_, MenuData::Empty) => 0,
            (MenuData::Tracks(list), MenuData::Tracks(more)) => splice(list, more, edge),
            (MenuData::Radios(list), MenuData::Radios(more)) => splice(list, more, edge),
            (MenuData::Playlists(list), MenuData::Playlists(more)) => splice(list, more, edge),
            (this, more) => {
                tracing::warn!(have = this.len(), offered = more.len(), "Menu payload kind mismatch, ignored");
                0
            }
        }
    }
}

/// A navigable unit of the browse tree.
///
/// Every hook has a trivial default (always succeed, no side effect), so a
/// node only overrides what it needs.
pub trait MenuNode: Send {
    /// Stable per node type and parameters, not per instance
    fn menu_key(&self) -> String;

    fn title(&self) -> String;

    fn data(&self) -> &MenuData;

    fn items(&self) -> Vec<MenuItem> {
        self.data().views()
    }

    fn is_playable(&self) -> bool {
        false
    }

    /// Whether "play" replaces the whole queue with this node's tracks
    fn reset_playlist_when_play(&self) -> bool {
        false
    }

    /// Playing from this node switches the controller into Intelligent FM
    fn is_fm_source(&self) -> bool {
        false
    }

    fn sub_menu(&self, _index: usize, _ctx: &HookContext) -> Option<Box<dyn MenuNode>> {
        None
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Continue
    }

    fn before_prev_page(&mut self, _ctx: &HookContext) -> bool {
        true
    }

    fn before_next_page(&mut self, _ctx: &HookContext) -> bool {
        true
    }

    fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Continue
    }

    fn top_out(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Continue
    }

    fn before_back(&mut self, _ctx: &HookContext) -> bool {
        true
    }

    /// Take in the payload fetched for `stage`. Returns the number of entries
    /// added to the cached list.
    fn absorb(&mut self, _stage: HookStage, _payload: &Value, _ctx: &HookContext) -> Result<usize, RemoteError> {
        Ok(0)
    }
}
