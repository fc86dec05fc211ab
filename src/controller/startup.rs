//! Session restoration and the daily sign-in

use chrono::Local;

use crate::model::{fetch, restore_all, Query, RecordType, Restored};
use super::{AppController, AppEvent};

const SIGN_IN_QUERIES: [Query; 3] = [
    Query::DailySignIn { kind: 0 },
    Query::DailySignIn { kind: 1 },
    Query::YunbeiSignIn,
];

fn today() -> String {
    Local::now().format("%Y%m%d").to_string()
}

impl AppController {
    /// Restore every record on its own, then kick off the daily sign-in
    /// when it is due
    pub fn startup(&mut self) {
        let restored = restore_all(self.store.as_ref());
        let last_sign_in = restored.last_sign_in.clone();
        self.apply_restored(restored);
        self.maybe_sign_in(last_sign_in.as_deref(), &today());
    }

    fn apply_restored(&mut self, restored: Restored) {
        if let Some(user) = restored.user {
            tracing::info!(user_id = user.id, "User restored");
            self.ctx.user = Some(user);
        }
        if let Some(mode) = restored.mode {
            self.player.set_mode(mode);
        }
        if let Some(volume) = restored.volume {
            self.player.set_volume(volume);
        }
        if let Err(e) = self.sink.set_volume(self.player.volume()) {
            tracing::warn!(error = %e, "Failed to apply restored volume");
        }
        if let Some(snapshot) = restored.snapshot {
            tracing::info!(
                tracks = snapshot.queue.len(),
                index = ?snapshot.current_index,
                updated_at = ?snapshot.updated_at,
                "Playback snapshot restored"
            );
            self.player.restore(snapshot);
        }
    }

    pub(crate) fn maybe_sign_in(&self, last: Option<&str>, today: &str) -> bool {
        if !self.settings.sign_in || self.ctx.user.is_none() || last == Some(today) {
            return false;
        }
        tracing::info!(last = last.unwrap_or("never"), "Daily sign-in due");
        let client = self.client.clone();
        let events = self.events.clone();
        let date = today.to_string();
        tokio::spawn(async move {
            let mut succeeded = 0;
            for query in &SIGN_IN_QUERIES {
                if fetch(client.as_ref(), query).await.is_ok() {
                    succeeded += 1;
                }
            }
            let _ = events.send(AppEvent::SignedIn { date, succeeded });
        });
        true
    }

    pub(crate) fn on_signed_in(&mut self, date: String, succeeded: usize) {
        if succeeded == 0 {
            tracing::warn!("Daily sign-in failed, will retry next start");
            return;
        }
        tracing::info!(succeeded, date = %date, "Daily sign-in done");
        self.writer.save(RecordType::LastSignInDate, &date);
        self.notifier.notify("Signed in", "Daily sign-in completed", None);
    }
}
