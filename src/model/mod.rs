//! Model module - Engine state and data types
//!
//! Organized into submodules by responsibility:
//!
//! - `types`: Core value types (tracks, play modes, UI mode)
//! - `catalogue_client`: Remote catalogue seam and its HTTP implementation
//! - `content`: Catalogue payload decoding
//! - `menu`: The `MenuNode` contract and hook types
//! - `menus`: Concrete menus of the browse tree
//! - `navigation`: Navigation stack and hook-gated transitions
//! - `playback`: Play queue, play modes and session snapshot
//! - `store`: Key-model persistence
//! - `render`: Render snapshot for the view

mod types;
mod catalogue_client;
mod content;
mod menu;
mod menus;
mod navigation;
mod playback;
mod store;
mod render;

pub use types::{MenuItem, PlayMode, PlaylistRef, Radio, Track, UiMode, User};

pub use catalogue_client::{
    classify, fetch, CatalogueClient, FetchResult, HttpCatalogueClient, Query, SUCCESS_CODE,
};

pub use content::fm_songs;

pub use menu::{Edge, Hook, HookContext, HookStage, MenuData, MenuNode};

pub use menus::{
    DailyRecommendSongsMenu, DjRadioDetailMenu, DjTodayRecommendMenu, MainMenu, PersonalFmMenu,
    PlaylistDetailMenu, UserPlaylistsMenu, FETCH_LIMIT,
};

pub use navigation::{Completion, Frame, NavigationStack, Ticket, Transition};

pub use playback::{
    PlaybackController, PlaybackTiming, SessionSnapshot, Step, MAX_VOLUME, RESTORED_MENU_KEY,
    VOLUME_STEP,
};

pub use store::{
    decode, encode, load, restore_all, save, FileStore, MemoryStore, RecordType, Restored, Store,
    StoreWriter,
};

pub use render::RenderModel;
