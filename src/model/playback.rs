//! Play queue, play modes and the session snapshot

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::menu::MenuNode;
use super::types::{PlayMode, Track};

pub const VOLUME_STEP: u8 = 5;
pub const MAX_VOLUME: u8 = 100;

/// Menu key given to a queue restored from the store
pub const RESTORED_MENU_KEY: &str = "from_local_db";

/// Persisted projection of the controller
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub queue: Vec<Track>,
    pub current_index: Option<usize>,
    pub updated_at: Option<DateTime<Utc>>,
    pub menu_key: String,
}

/// What the engine should do after a next/previous request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Play(usize),
    Stop,
    /// The continuous feed ran dry; fetch another batch
    TopUp,
    /// A top-up is already in flight
    Waiting,
}

/// Position clock for the progress bar
#[derive(Clone, Debug)]
pub struct PlaybackTiming {
    pub position_ms: u32,
    pub last_update: Instant,
    pub is_playing: bool,
    pub duration_ms: u32,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            position_ms: 0,
            last_update: Instant::now(),
            is_playing: false,
            duration_ms: 0,
        }
    }
}

impl PlaybackTiming {
    pub fn current_position_ms(&self) -> u32 {
        self.position_after(self.last_update.elapsed())
    }

    fn position_after(&self, elapsed: Duration) -> u32 {
        if self.is_playing && self.duration_ms > 0 {
            let elapsed = u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX);
            self.position_ms.saturating_add(elapsed).min(self.duration_ms)
        } else {
            self.position_ms.min(self.duration_ms.max(1) - 1)
        }
    }

    fn start(&mut self, duration_ms: u32) {
        self.position_ms = 0;
        self.duration_ms = duration_ms;
        self.last_update = Instant::now();
        self.is_playing = true;
    }

    fn set_playing(&mut self, is_playing: bool) {
        self.position_ms = self.current_position_ms();
        self.last_update = Instant::now();
        self.is_playing = is_playing;
    }
}

pub struct PlaybackController {
    queue: Vec<Track>,
    current: Option<usize>,
    mode: PlayMode,
    /// Mode to return to when a replacement leaves Intelligent FM
    prior_mode: PlayMode,
    /// Queue came from the FM feed, so running off its end tops it up
    fm_queue: bool,
    awaiting_top_up: bool,
    /// Bumped whenever a pending top-up is superseded
    top_up_generation: u64,
    volume: u8,
    playing_menu_key: String,
    updated_at: Option<DateTime<Utc>>,
    pub(crate) timing: PlaybackTiming,
}

impl PlaybackController {
    pub fn new(volume: u8) -> Self {
        Self {
            queue: Vec::new(),
            current: None,
            mode: PlayMode::default(),
            prior_mode: PlayMode::default(),
            fm_queue: false,
            awaiting_top_up: false,
            top_up_generation: 0,
            volume: volume.min(MAX_VOLUME),
            playing_menu_key: String::new(),
            updated_at: None,
            timing: PlaybackTiming::default(),
        }
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.queue.get(i))
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.timing.is_playing
    }

    pub fn playing_menu_key(&self) -> &str {
        &self.playing_menu_key
    }

    pub fn awaiting_top_up(&self) -> bool {
        self.awaiting_top_up
    }

    /// Tag for the top-up requested by the latest `Step::TopUp`
    pub fn top_up_generation(&self) -> u64 {
        self.top_up_generation
    }

    /// A top-up result belongs to the request still pending
    pub fn accepts_top_up(&self, generation: u64) -> bool {
        self.awaiting_top_up && generation == self.top_up_generation
    }

    /// Forget the pending top-up; its result will no longer be accepted
    fn cancel_top_up(&mut self) {
        if self.awaiting_top_up {
            self.awaiting_top_up = false;
            self.top_up_generation += 1;
        }
    }

    /// Point at `index`. Out-of-range is a bug: loud in tests, clamped otherwise.
    fn set_current(&mut self, index: usize) {
        debug_assert!(index < self.queue.len(), "index {} out of queue of {}", index, self.queue.len());
        self.current = if self.queue.is_empty() {
            None
        } else {
            Some(index.min(self.queue.len() - 1))
        };
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Mark the current track as started in the clock
    pub fn started(&mut self) {
        let duration = self.current_track().map(|t| t.duration_ms).unwrap_or(0);
        self.timing.start(duration);
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.timing.set_playing(is_playing);
    }

    fn random_other<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
        let len = self.queue.len();
        if len <= 1 {
            return 0;
        }
        // uniform over every index except `current`
        let pick = rng.gen_range(0..len - 1);
        if pick >= current { pick + 1 } else { pick }
    }

    /// Pick the next track by the mode's rule without mutating anything
    pub fn peek_next<R: Rng + ?Sized>(&self, rng: &mut R) -> Step {
        if self.queue.is_empty() {
            return if self.mode == PlayMode::IntelligentFm { Step::TopUp } else { Step::Stop };
        }
        let Some(current) = self.current else {
            return Step::Play(0);
        };
        let len = self.queue.len();
        match self.mode {
            PlayMode::SingleLoop => Step::Play(current),
            PlayMode::ListLoop => Step::Play((current + 1) % len),
            PlayMode::Random => Step::Play(self.random_other(current, rng)),
            PlayMode::Ordered if current + 1 < len => Step::Play(current + 1),
            PlayMode::Ordered if self.fm_queue => Step::TopUp,
            PlayMode::Ordered => Step::Stop,
            PlayMode::IntelligentFm if current + 1 < len => Step::Play(current + 1),
            PlayMode::IntelligentFm => Step::TopUp,
        }
    }

    /// Advance by the mode's rule. `Play` has already moved the index.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Step {
        let step = self.peek_next(rng);
        match step {
            Step::Play(index) => self.set_current(index),
            Step::Stop => self.set_playing(false),
            Step::TopUp if self.awaiting_top_up => return Step::Waiting,
            Step::TopUp => self.awaiting_top_up = true,
            Step::Waiting => {}
        }
        step
    }

    pub fn previous<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Step {
        if self.queue.is_empty() {
            return Step::Stop;
        }
        self.cancel_top_up();
        let Some(current) = self.current else {
            self.set_current(0);
            return Step::Play(0);
        };
        let len = self.queue.len();
        let index = match self.mode {
            PlayMode::SingleLoop => current,
            PlayMode::Random => self.random_other(current, rng),
            PlayMode::ListLoop => (current + len - 1) % len,
            PlayMode::Ordered | PlayMode::IntelligentFm => current.saturating_sub(1),
        };
        self.set_current(index);
        Step::Play(index)
    }

    /// Apply an FM batch fetched because the queue ran dry. Returns the index
    /// to play, or `None` when nothing new arrived. Callers check
    /// `accepts_top_up` first; a batch with nothing pending is ignored.
    pub fn finish_top_up(&mut self, batch: Vec<Track>) -> Option<usize> {
        if !self.awaiting_top_up {
            return None;
        }
        self.awaiting_top_up = false;
        if batch.is_empty() {
            self.set_playing(false);
            return None;
        }
        let next = self.current.map(|i| i + 1).unwrap_or(0);
        self.queue.extend(batch);
        self.set_current(next);
        Some(next)
    }

    pub fn abandon_top_up(&mut self) {
        if !self.awaiting_top_up {
            return;
        }
        self.awaiting_top_up = false;
        self.set_playing(false);
    }

    /// Append tracks loaded into the playing menu after play began
    pub fn extend_queue(&mut self, tracks: &[Track]) {
        self.queue.extend_from_slice(tracks);
        self.touch();
    }

    /// "Play" on entry `index` of a playable menu. The node decides whether
    /// its list replaces the queue or the entry slots into the current one.
    pub fn play_from_menu(&mut self, menu: &dyn MenuNode, index: usize) -> Option<usize> {
        let tracks = menu.data().tracks();
        let track = tracks.get(index)?.clone();
        let menu_key = menu.menu_key();
        self.cancel_top_up();

        if menu.reset_playlist_when_play() {
            self.queue = tracks.to_vec();
            self.fm_queue = menu.is_fm_source();
            if menu.is_fm_source() {
                self.enter_fm();
            } else {
                self.leave_fm();
            }
            self.playing_menu_key = menu_key;
            self.set_current(index);
            return Some(index);
        }

        let same_slot = menu_key == self.playing_menu_key
            && self.queue.get(index).map(|t| t.id) == Some(track.id);
        let target = if same_slot {
            index
        } else {
            let at = self.current.map(|i| i + 1).unwrap_or(0).min(self.queue.len());
            self.queue.insert(at, track);
            at
        };
        self.playing_menu_key = menu_key;
        self.set_current(target);
        Some(target)
    }

    fn enter_fm(&mut self) {
        if self.mode != PlayMode::IntelligentFm {
            self.prior_mode = self.mode;
            self.mode = PlayMode::IntelligentFm;
        }
    }

    fn leave_fm(&mut self) {
        if self.mode == PlayMode::IntelligentFm {
            self.mode = self.prior_mode;
        }
    }

    pub fn cycle_mode(&mut self) -> PlayMode {
        self.mode = self.mode.cycle();
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    pub fn volume_up(&mut self) -> u8 {
        self.volume = self.volume.saturating_add(VOLUME_STEP).min(MAX_VOLUME);
        self.volume
    }

    pub fn volume_down(&mut self) -> u8 {
        self.volume = self.volume.saturating_sub(VOLUME_STEP);
        self.volume
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            queue: self.queue.clone(),
            current_index: self.current,
            updated_at: self.updated_at,
            menu_key: self.playing_menu_key.clone(),
        }
    }

    /// Adopt a stored snapshot. A stored index past the queue is clamped.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        let len = snapshot.queue.len();
        self.current = match snapshot.current_index {
            _ if len == 0 => None,
            Some(i) if i >= len => {
                tracing::warn!(index = i, len, "Restored index out of range, clamped");
                Some(len - 1)
            }
            other => other,
        };
        self.queue = snapshot.queue;
        self.updated_at = snapshot.updated_at;
        self.playing_menu_key = RESTORED_MENU_KEY.to_string();
        self.fm_queue = false;
        self.cancel_top_up();
        self.timing = PlaybackTiming::default();
    }
}
