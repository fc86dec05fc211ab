//! Controller module - the orchestrator
//!
//! `AppController` is the single owner of navigation and playback state.
//! Input, ticks, fetch results and audio reports all arrive as `AppEvent`s
//! and are applied one at a time; background tasks only compute results and
//! post them back. It is organized into submodules by responsibility:
//!
//! - `input`: Key routing by UI mode
//! - `navigation`: Menu transitions and hook fetches
//! - `playback`: Queue, transport and persistence of playback state
//! - `startup`: Session restoration and daily sign-in

mod input;
mod navigation;
mod playback;
mod startup;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::audio::{AudioEvent, AudioSink};
use crate::config::Config;
use crate::error::RemoteError;
use crate::model::{
    CatalogueClient, FetchResult, HookContext, MainMenu, NavigationStack, PlaybackController,
    RenderModel, Store, StoreWriter, Ticket, UiMode,
};
use crate::notify::Notifier;

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A hook fetch finished
    Fetched { ticket: Ticket, result: FetchResult },
    /// An FM batch requested because the queue ran dry; `generation`
    /// tags the request it answers
    ToppedUp { generation: u64, result: FetchResult },
    /// Daily sign-in finished; `succeeded` counts accepted calls
    SignedIn { date: String, succeeded: usize },
    Audio(AudioEvent),
    Shutdown,
}

/// External collaborators handed to the controller at construction
pub struct Collaborators {
    pub client: Arc<dyn CatalogueClient>,
    pub store: Arc<dyn Store>,
    pub sink: Box<dyn AudioSink>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub page_size: usize,
    pub stream_template: String,
    pub default_volume: u8,
    pub notice_ttl: Duration,
    pub sign_in: bool,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.main.page_size.max(1),
            stream_template: config.player.stream_url_template.clone(),
            default_volume: config.player.default_volume,
            notice_ttl: Duration::from_secs(config.main.notice_secs),
            sign_in: config.startup.sign_in,
        }
    }
}

pub struct AppController {
    pub(crate) nav: NavigationStack,
    pub(crate) player: PlaybackController,
    pub(crate) ui_mode: UiMode,
    pub(crate) ctx: HookContext,
    client: Arc<dyn CatalogueClient>,
    store: Arc<dyn Store>,
    writer: StoreWriter,
    sink: Box<dyn AudioSink>,
    notifier: Arc<dyn Notifier>,
    events: mpsc::UnboundedSender<AppEvent>,
    settings: EngineSettings,
    rng: StdRng,
    /// Identifies the latest `play` handed to the sink
    play_token: u64,
    /// The sink holds a started track (playing or paused)
    sink_active: bool,
    notice: Option<(String, Instant)>,
    should_quit: bool,
}

impl AppController {
    /// Must be called inside a tokio runtime: the store writer task is
    /// spawned here.
    pub fn new(
        parts: Collaborators,
        settings: EngineSettings,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let ctx = HookContext {
            user: None,
            page_size: settings.page_size,
            stream_template: settings.stream_template.clone(),
        };
        Self {
            nav: NavigationStack::new(Box::new(MainMenu::new()), settings.page_size),
            player: PlaybackController::new(settings.default_volume),
            ui_mode: UiMode::Menu,
            ctx,
            client: parts.client,
            writer: StoreWriter::spawn(parts.store.clone()),
            store: parts.store,
            sink: parts.sink,
            notifier: parts.notifier,
            events,
            settings,
            rng: StdRng::from_entropy(),
            play_token: 0,
            sink_active: false,
            notice: None,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn ui_mode(&self) -> UiMode {
        self.ui_mode
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.nav
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.player
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key_event(key),
            AppEvent::Resize => {}
            AppEvent::Tick => self.expire_notice(),
            AppEvent::Fetched { ticket, result } => self.on_fetched(ticket, result),
            AppEvent::ToppedUp { generation, result } => self.on_topped_up(generation, result),
            AppEvent::SignedIn { date, succeeded } => self.on_signed_in(date, succeeded),
            AppEvent::Audio(event) => self.on_audio(event),
            AppEvent::Shutdown => self.should_quit = true,
        }
    }

    /// Pure snapshot for the view
    pub fn current_view(&self) -> RenderModel {
        let mut view = RenderModel::build(&self.nav, &self.player, self.ui_mode);
        view.notice = self.notice().map(str::to_string);
        view.user = self.ctx.user.as_ref().map(|u| u.nickname.clone());
        view
    }

    /// Orderly shutdown: stop audio and wait for the final records to land
    pub async fn shutdown(&mut self) {
        self.sink.stop();
        self.persist_queue();
        self.writer.flush().await;
        tracing::info!("Controller shut down, state flushed");
    }

    pub(crate) fn show_notice(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(notice = %text, "Notice");
        self.notice = Some((text, Instant::now()));
    }

    fn expire_notice(&mut self) {
        if let Some((_, since)) = &self.notice {
            if since.elapsed() >= self.settings.notice_ttl {
                self.notice = None;
            }
        }
    }

    pub(crate) fn format_error(error: &RemoteError) -> String {
        match error {
            RemoteError::Status(301) => "Sign-in required. Log in and try again.".to_string(),
            RemoteError::Status(code) => format!("Request failed (code {}).", code),
            RemoteError::Transport(_) => "Network unavailable. Please try again.".to_string(),
            RemoteError::Malformed(_) => "Unexpected response from server.".to_string(),
        }
    }
}
