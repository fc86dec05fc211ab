//! Navigation-related controller methods (menu transitions, hook fetches)

use crate::model::{fetch, Completion, FetchResult, HookStage, Query, Ticket, Transition};
use super::{AppController, AppEvent};

impl AppController {
    pub fn move_up(&mut self) {
        let transition = self.nav.move_up(&self.ctx);
        self.apply_transition(transition);
    }

    pub fn move_down(&mut self) {
        let transition = self.nav.move_down(&self.ctx);
        self.apply_transition(transition);
    }

    pub fn prev_page(&mut self) {
        let transition = self.nav.prev_page(&self.ctx);
        self.apply_transition(transition);
    }

    pub fn next_page(&mut self) {
        let transition = self.nav.next_page(&self.ctx);
        self.apply_transition(transition);
    }

    pub fn go_back(&mut self) {
        let transition = self.nav.back(&self.ctx);
        if transition == Transition::Cancelled {
            self.show_notice("Loading cancelled");
        }
        self.apply_transition(transition);
    }

    /// Enter on a row: play it when the menu is playable, open it otherwise
    pub fn activate_selected(&mut self) {
        if self.nav.is_loading() {
            return;
        }
        let top = self.nav.top();
        if top.node.is_playable() && !top.node.data().tracks().is_empty() {
            self.play_selected();
            return;
        }
        let depth = self.nav.depth();
        let transition = self.nav.enter_selected(&self.ctx);
        if transition == Transition::Rejected {
            self.show_notice(self.entry_refusal());
        }
        self.apply_transition(transition);
        if self.nav.depth() > depth {
            self.focus_playing_track();
        }
    }

    fn entry_refusal(&self) -> &'static str {
        if self.ctx.user.is_none() {
            "Sign in to open this menu"
        } else {
            "This menu is not available"
        }
    }

    fn apply_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Fetching(ticket, query) => self.spawn_fetch(ticket, query),
            Transition::Committed
            | Transition::Rejected
            | Transition::Ignored
            | Transition::Cancelled => {}
        }
    }

    /// Run a hook's query off the event loop and post the result back
    pub(crate) fn spawn_fetch(&self, ticket: Ticket, query: Query) {
        tracing::debug!(menu_key = %ticket.menu_key, stage = ?ticket.stage, "Hook fetch dispatched");
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = fetch(client.as_ref(), &query).await;
            let _ = events.send(AppEvent::Fetched { ticket, result });
        });
    }

    pub(crate) fn on_fetched(&mut self, ticket: Ticket, result: FetchResult) {
        match self.nav.complete(&ticket, result, &self.ctx) {
            Completion::Committed { stage: HookStage::Enter, added } => {
                tracing::info!(menu_key = %ticket.menu_key, added, "Menu loaded");
                self.focus_playing_track();
            }
            Completion::Committed { stage, added } => {
                tracing::debug!(menu_key = %ticket.menu_key, stage = ?stage, added, "Menu extended");
                if stage == HookStage::BottomOut {
                    self.follow_playing_menu(added);
                }
            }
            Completion::Failed(e) => {
                tracing::warn!(menu_key = %ticket.menu_key, error = %e, "Hook fetch failed");
                self.show_notice(Self::format_error(&e));
            }
            Completion::Exhausted => self.show_notice("No more entries"),
            Completion::Stale => {}
        }
    }

    /// When the menu being extended is the one the queue was built from,
    /// the queue grows with it
    fn follow_playing_menu(&mut self, added: usize) {
        let node = &self.nav.top().node;
        if !node.reset_playlist_when_play() || node.menu_key() != self.player.playing_menu_key() {
            return;
        }
        let tracks = node.data().tracks();
        let fresh = tracks[tracks.len().saturating_sub(added)..].to_vec();
        self.player.extend_queue(&fresh);
        self.persist_queue();
    }

    /// Entering the menu that is playing puts the cursor on the playing track
    pub(crate) fn focus_playing_track(&mut self) {
        if self.nav.top().node.menu_key() != self.player.playing_menu_key() {
            return;
        }
        if let Some(index) = self.player.current_index() {
            self.nav.select(index);
        }
    }
}
