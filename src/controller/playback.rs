//! Playback control methods

use crate::audio::AudioEvent;
use crate::model::{fetch, fm_songs, FetchResult, Query, RecordType, Step};
use super::{AppController, AppEvent};

impl AppController {
    /// Play the selected row of the current menu
    pub fn play_selected(&mut self) {
        let top = self.nav.top();
        let index = top.selected;
        let mode_before = self.player.mode();
        let Some(started) = self.player.play_from_menu(top.node.as_ref(), index) else {
            return;
        };
        tracing::info!(menu_key = %self.player.playing_menu_key(), index = started, "Playing from menu");
        if self.player.mode() != mode_before {
            self.persist_mode();
        }
        self.start_current();
        self.persist_queue();
    }

    pub fn next_track(&mut self) {
        let step = self.player.next(&mut self.rng);
        self.apply_step(step);
    }

    pub fn previous_track(&mut self) {
        let step = self.player.previous(&mut self.rng);
        self.apply_step(step);
    }

    fn apply_step(&mut self, step: Step) {
        match step {
            Step::Play(index) => {
                tracing::debug!(index, mode = ?self.player.mode(), "Advancing");
                self.start_current();
                self.persist_queue();
            }
            Step::Stop => {
                tracing::info!("Queue finished, playback stopped");
                self.sink.stop();
                self.sink_active = false;
            }
            Step::TopUp => self.spawn_top_up(),
            Step::Waiting => {}
        }
    }

    /// Hand the current track to the sink
    fn start_current(&mut self) {
        let Some(track) = self.player.current_track().cloned() else {
            return;
        };
        self.play_token += 1;
        match self.sink.play(&track, self.play_token) {
            Ok(()) => {
                self.player.started();
                self.sink_active = true;
                tracing::info!(track_id = track.id, title = %track.title, "Track started");
            }
            Err(e) => {
                tracing::error!(track_id = track.id, error = %e, "Failed to start track");
                self.player.set_playing(false);
                self.sink_active = false;
                self.show_notice(format!("Cannot play {}", track.title));
            }
        }
    }

    pub fn toggle_playback(&mut self) {
        if !self.sink_active {
            if self.player.awaiting_top_up() {
                self.show_notice("Fetching more FM tracks...");
                return;
            }
            if self.player.current_track().is_some() {
                self.start_current();
            } else {
                self.next_track();
            }
            return;
        }
        let playing = !self.player.is_playing();
        if let Err(e) = self.sink.set_paused(!playing) {
            tracing::error!(error = %e, "Toggle playback failed");
            self.show_notice("Playback control failed");
            return;
        }
        self.player.set_playing(playing);
        tracing::info!(action = if playing { "resumed" } else { "paused" }, "Playback toggled");
    }

    pub fn cycle_mode(&mut self) {
        let mode = self.player.cycle_mode();
        tracing::info!(mode = ?mode, "Play mode changed");
        self.show_notice(format!("Mode: {}", mode.label()));
        self.persist_mode();
    }

    pub fn volume_up(&mut self) {
        let volume = self.player.volume_up();
        self.apply_volume(volume);
    }

    pub fn volume_down(&mut self) {
        let volume = self.player.volume_down();
        self.apply_volume(volume);
    }

    fn apply_volume(&mut self, volume: u8) {
        if let Err(e) = self.sink.set_volume(volume) {
            tracing::warn!(error = %e, "Failed to set volume");
        }
        self.writer.save(RecordType::Volume, &volume);
    }

    fn spawn_top_up(&self) {
        tracing::info!("FM queue exhausted, fetching next batch");
        let generation = self.player.top_up_generation();
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = fetch(client.as_ref(), &Query::PersonalFm).await;
            let _ = events.send(AppEvent::ToppedUp { generation, result });
        });
    }

    pub(crate) fn on_topped_up(&mut self, generation: u64, result: FetchResult) {
        if !self.player.accepts_top_up(generation) {
            // the queue was replaced while the batch was in flight
            tracing::debug!(generation, "Stale FM top-up discarded");
            return;
        }
        let batch = result.and_then(|payload| fm_songs(&payload, &self.ctx.stream_template));
        match batch {
            Ok(tracks) => match self.player.finish_top_up(tracks) {
                Some(index) => {
                    tracing::info!(index, queue = self.player.queue().len(), "FM queue topped up");
                    self.start_current();
                    self.persist_queue();
                }
                None => {
                    self.sink_active = false;
                    self.show_notice("FM returned no new tracks");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "FM top-up failed");
                self.player.abandon_top_up();
                self.sink_active = false;
                self.show_notice(Self::format_error(&e));
            }
        }
    }

    pub(crate) fn on_audio(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Finished { token } if token == self.play_token => {
                tracing::debug!(token, "Track finished");
                self.next_track();
            }
            AudioEvent::Failed { token } if token == self.play_token => {
                self.sink_active = false;
                self.player.set_playing(false);
                let title = self.player.current_track().map(|t| t.title.clone()).unwrap_or_default();
                self.show_notice(format!("Playback failed: {}", title));
            }
            // report for a track that was already replaced
            AudioEvent::Finished { .. } | AudioEvent::Failed { .. } => {}
        }
    }

    /// Queue the snapshot write; it reflects the state after the mutation
    pub(crate) fn persist_queue(&self) {
        self.writer.save(RecordType::PlaybackSnapshot, &self.player.snapshot());
    }

    pub(crate) fn persist_mode(&self) {
        self.writer.save(RecordType::PlayMode, &self.player.mode());
    }
}
