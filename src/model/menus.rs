//! Concrete menus of the browse tree

use serde_json::Value;

use crate::error::RemoteError;
use super::catalogue_client::Query;
use super::content;
use super::menu::{Edge, Hook, HookContext, HookStage, MenuData, MenuNode};
use super::types::MenuItem;

/// Page size asked from the remote for offset-paginated lists
pub const FETCH_LIMIT: usize = 50;

fn edge_for(stage: HookStage) -> Edge {
    match stage {
        HookStage::TopOut => Edge::Front,
        HookStage::Enter | HookStage::BottomOut => Edge::Back,
    }
}

/// Root of the tree. Static children, nothing to load.
#[derive(Default)]
pub struct MainMenu {
    data: MenuData,
}

impl MainMenu {
    pub const ENTRIES: [&'static str; 4] = [
        "Personal FM",
        "Daily Recommend Songs",
        "My Playlists",
        "DJ Today Recommend",
    ];

    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuNode for MainMenu {
    fn menu_key(&self) -> String {
        "main".to_string()
    }

    fn title(&self) -> String {
        "cloudtune".to_string()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn items(&self) -> Vec<MenuItem> {
        Self::ENTRIES.iter().map(|e| MenuItem::new(*e)).collect()
    }

    fn sub_menu(&self, index: usize, ctx: &HookContext) -> Option<Box<dyn MenuNode>> {
        match index {
            0 => Some(Box::new(PersonalFmMenu::new())),
            1 => Some(Box::new(DailyRecommendSongsMenu::new())),
            2 => Some(Box::new(UserPlaylistsMenu::new(ctx.user.as_ref().map(|u| u.id)))),
            3 => Some(Box::new(DjTodayRecommendMenu::new())),
            _ => None,
        }
    }
}

/// Personalized continuous feed; the source of Intelligent FM.
#[derive(Default)]
pub struct PersonalFmMenu {
    data: MenuData,
}

impl PersonalFmMenu {
    pub const KEY: &'static str = "personal_fm";

    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuNode for PersonalFmMenu {
    fn menu_key(&self) -> String {
        Self::KEY.to_string()
    }

    fn title(&self) -> String {
        "Personal FM".to_string()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn reset_playlist_when_play(&self) -> bool {
        true
    }

    fn is_fm_source(&self) -> bool {
        true
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::PersonalFm)
    }

    fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Fetch(Query::PersonalFm)
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, ctx: &HookContext) -> Result<usize, RemoteError> {
        let songs = content::fm_songs(payload, &ctx.stream_template)?;
        Ok(self.data.extend(MenuData::Tracks(songs), edge_for(stage)))
    }
}

#[derive(Default)]
pub struct DailyRecommendSongsMenu {
    data: MenuData,
}

impl DailyRecommendSongsMenu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuNode for DailyRecommendSongsMenu {
    fn menu_key(&self) -> String {
        "daily_recommend".to_string()
    }

    fn title(&self) -> String {
        "Daily Recommend Songs".to_string()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn reset_playlist_when_play(&self) -> bool {
        true
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::RecommendSongs)
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, ctx: &HookContext) -> Result<usize, RemoteError> {
        let songs = content::daily_songs(payload, &ctx.stream_template)?;
        Ok(self.data.extend(MenuData::Tracks(songs), edge_for(stage)))
    }
}

/// Playlists of the signed-in user. Refuses entry when signed out.
pub struct UserPlaylistsMenu {
    uid: Option<u64>,
    data: MenuData,
}

impl UserPlaylistsMenu {
    pub fn new(uid: Option<u64>) -> Self {
        Self { uid, data: MenuData::Empty }
    }
}

impl MenuNode for UserPlaylistsMenu {
    fn menu_key(&self) -> String {
        format!("user_playlists_{}", self.uid.unwrap_or_default())
    }

    fn title(&self) -> String {
        "My Playlists".to_string()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn sub_menu(&self, index: usize, _ctx: &HookContext) -> Option<Box<dyn MenuNode>> {
        match &self.data {
            MenuData::Playlists(playlists) => playlists
                .get(index)
                .map(|p| Box::new(PlaylistDetailMenu::new(p.id, p.name.clone())) as Box<dyn MenuNode>),
            _ => None,
        }
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        let Some(uid) = self.uid else {
            return Hook::Abort;
        };
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::UserPlaylists { uid, offset: 0, limit: FETCH_LIMIT })
    }

    fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
        match self.uid {
            Some(uid) => Hook::Fetch(Query::UserPlaylists {
                uid,
                offset: self.data.len(),
                limit: FETCH_LIMIT,
            }),
            None => Hook::Abort,
        }
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, _ctx: &HookContext) -> Result<usize, RemoteError> {
        let playlists = content::user_playlists(payload)?;
        Ok(self.data.extend(MenuData::Playlists(playlists), edge_for(stage)))
    }
}

pub struct PlaylistDetailMenu {
    id: u64,
    name: String,
    data: MenuData,
}

impl PlaylistDetailMenu {
    pub fn new(id: u64, name: String) -> Self {
        Self { id, name, data: MenuData::Empty }
    }
}

impl MenuNode for PlaylistDetailMenu {
    fn menu_key(&self) -> String {
        format!("playlist_{}", self.id)
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn reset_playlist_when_play(&self) -> bool {
        true
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::PlaylistDetail { id: self.id })
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, ctx: &HookContext) -> Result<usize, RemoteError> {
        let tracks = content::playlist_tracks(payload, &ctx.stream_template)?;
        Ok(self.data.extend(MenuData::Tracks(tracks), edge_for(stage)))
    }
}

/// Today's recommended radios. Bottoming out asks for another page and
/// appends it.
#[derive(Default)]
pub struct DjTodayRecommendMenu {
    data: MenuData,
    pages: u32,
}

impl DjTodayRecommendMenu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuNode for DjTodayRecommendMenu {
    fn menu_key(&self) -> String {
        "dj_today_recommend".to_string()
    }

    fn title(&self) -> String {
        "DJ Today Recommend".to_string()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn sub_menu(&self, index: usize, _ctx: &HookContext) -> Option<Box<dyn MenuNode>> {
        match &self.data {
            MenuData::Radios(radios) => radios
                .get(index)
                .map(|r| Box::new(DjRadioDetailMenu::new(r.id, r.name.clone())) as Box<dyn MenuNode>),
            _ => None,
        }
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::DjTodayPreferred { page: 0 })
    }

    fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Fetch(Query::DjTodayPreferred { page: self.pages })
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, _ctx: &HookContext) -> Result<usize, RemoteError> {
        let radios = content::dj_radios(payload)?;
        self.pages += 1;
        Ok(self.data.extend(MenuData::Radios(radios), edge_for(stage)))
    }
}

/// Programs of one radio. Playing a program slots it in after the current
/// track instead of replacing the queue.
pub struct DjRadioDetailMenu {
    radio_id: u64,
    name: String,
    data: MenuData,
}

impl DjRadioDetailMenu {
    pub fn new(radio_id: u64, name: String) -> Self {
        Self { radio_id, name, data: MenuData::Empty }
    }
}

impl MenuNode for DjRadioDetailMenu {
    fn menu_key(&self) -> String {
        format!("dj_radio_{}", self.radio_id)
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn data(&self) -> &MenuData {
        &self.data
    }

    fn is_playable(&self) -> bool {
        true
    }

    fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
        if !self.data.is_empty() {
            return Hook::Continue;
        }
        Hook::Fetch(Query::DjPrograms { radio_id: self.radio_id, offset: 0, limit: FETCH_LIMIT })
    }

    fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
        Hook::Fetch(Query::DjPrograms {
            radio_id: self.radio_id,
            offset: self.data.len(),
            limit: FETCH_LIMIT,
        })
    }

    fn absorb(&mut self, stage: HookStage, payload: &Value, ctx: &HookContext) -> Result<usize, RemoteError> {
        let programs = content::dj_programs(payload, &ctx.stream_template)?;
        Ok(self.data.extend(MenuData::Tracks(programs), edge_for(stage)))
    }
}
