use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use cloudtune::audio::AudioSink;
use cloudtune::controller::{AppController, AppEvent, Collaborators, EngineSettings};
use cloudtune::error::RemoteError;
use cloudtune::model::{
    load, save, CatalogueClient, MemoryStore, PlayMode, Query, RecordType, SessionSnapshot, Store,
    Track, User, RESTORED_MENU_KEY,
};
use cloudtune::notify::LogNotifier;

/// Catalogue that answers each path from a script, in order
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<HashMap<&'static str, VecDeque<(i64, Value)>>>,
    calls: Mutex<Vec<Query>>,
}

impl ScriptedClient {
    fn reply(self, path: &'static str, code: i64, body: Value) -> Self {
        self.replies.lock().unwrap().entry(path).or_default().push_back((code, body));
        self
    }

    fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|q| q.path() == path).count()
    }
}

impl CatalogueClient for ScriptedClient {
    fn call<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<(i64, Value), RemoteError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(query.clone());
            let reply = self.replies.lock().unwrap().get_mut(query.path()).and_then(VecDeque::pop_front);
            reply.ok_or_else(|| RemoteError::Transport(format!("no script for {}", query.path())))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SinkCall {
    Play(u64),
    Paused(bool),
    Volume(u8),
    Stop,
}

#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, track: &Track, _token: u64) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Play(track.id));
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Paused(paused));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Volume(volume));
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push(SinkCall::Stop);
    }
}

struct Harness {
    controller: AppController,
    events: mpsc::UnboundedReceiver<AppEvent>,
    client: Arc<ScriptedClient>,
    store: Arc<MemoryStore>,
    sink: RecordingSink,
}

impl Harness {
    fn new(client: ScriptedClient, store: MemoryStore) -> Self {
        let client = Arc::new(client);
        let store = Arc::new(store);
        let sink = RecordingSink::default();
        let (tx, events) = mpsc::unbounded_channel();
        let settings = EngineSettings {
            page_size: 10,
            stream_template: "s://{id}".to_string(),
            default_volume: 50,
            notice_ttl: Duration::from_secs(4),
            sign_in: true,
        };
        let parts = Collaborators {
            client: client.clone(),
            store: store.clone(),
            sink: Box::new(sink.clone()),
            notifier: Arc::new(LogNotifier),
        };
        let mut controller = AppController::new(parts, settings, tx);
        controller.startup();
        Self { controller, events, client, store, sink }
    }

    fn key(&mut self, code: KeyCode) {
        self.controller
            .handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    /// Take the next background result without applying it
    async fn next_event(&mut self) -> AppEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("background result in time")
            .expect("event channel open")
    }

    /// Apply the next background result
    async fn pump(&mut self) {
        let event = self.next_event().await;
        self.controller.handle_event(event);
    }

    /// Enter Personal FM from the main menu and start its first track
    async fn play_fm(&mut self) {
        self.key(KeyCode::Enter);
        self.pump().await;
        self.key(KeyCode::Enter);
    }

    fn played(&self) -> Vec<u64> {
        self.sink
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SinkCall::Play(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn queue_ids(&self) -> Vec<u64> {
        self.controller.playback().queue().iter().map(|t| t.id).collect()
    }
}

fn songs(ids: &[u64]) -> Value {
    json!({
        "code": 200,
        "data": ids.iter().map(|id| json!({ "id": id, "name": format!("song {}", id), "dt": 1000 })).collect::<Vec<_>>()
    })
}

fn track(id: u64) -> Track {
    Track {
        id,
        title: format!("song {}", id),
        artists: vec![],
        album: String::new(),
        duration_ms: 1000,
        locator: format!("s://{}", id),
    }
}

#[tokio::test]
async fn fm_queue_tops_up_when_exhausted() {
    let client = ScriptedClient::default()
        .reply("/personal_fm", 200, songs(&[1, 2, 3]))
        .reply("/personal_fm", 200, songs(&[4, 5]));
    let mut h = Harness::new(client, MemoryStore::new());

    // Main menu row 0 is Personal FM
    h.key(KeyCode::Enter);
    assert!(h.controller.navigation().is_loading());
    h.pump().await;
    assert_eq!(h.controller.navigation().top().node.menu_key(), "personal_fm");

    h.key(KeyCode::Enter);
    assert_eq!(h.controller.playback().mode(), PlayMode::IntelligentFm);
    assert_eq!(h.played(), vec![1]);

    h.key(KeyCode::Char('n'));
    h.key(KeyCode::Char('n'));
    assert_eq!(h.controller.playback().current_index(), Some(2));

    h.key(KeyCode::Char('n'));
    h.pump().await;

    assert_eq!(h.queue_ids(), vec![1, 2, 3, 4, 5]);
    assert_eq!(h.controller.playback().current_index(), Some(3));
    assert_eq!(h.played(), vec![1, 2, 3, 4]);
    assert_eq!(h.client.calls_to("/personal_fm"), 2);
}

#[tokio::test]
async fn failed_entry_leaves_menu_in_place() {
    let client = ScriptedClient::default().reply("/recommend/songs", 502, json!({ "code": 502 }));
    let mut h = Harness::new(client, MemoryStore::new());

    h.key(KeyCode::Down);
    h.key(KeyCode::Enter);
    h.pump().await;

    let nav = h.controller.navigation();
    assert_eq!(nav.depth(), 1);
    assert_eq!(nav.top().node.menu_key(), "main");
    assert_eq!(nav.top().selected, 1);
    assert!(!nav.is_loading());
    assert!(h.controller.notice().is_some());
}

#[tokio::test]
async fn reentering_playing_menu_focuses_current_track() {
    let detail = json!({ "code": 200, "playlist": { "tracks": [{ "id": 7 }, { "id": 8 }, { "id": 9 }] } });
    let client = ScriptedClient::default()
        .reply(
            "/user/playlist",
            200,
            json!({ "code": 200, "playlist": [{ "id": 70, "name": "mine", "trackCount": 3 }] }),
        )
        .reply("/playlist/detail", 200, detail.clone())
        .reply("/playlist/detail", 200, detail);
    let store = MemoryStore::new();
    save(&store, RecordType::UserIdentity, &User { id: 3, nickname: "me".into() }).unwrap();
    save(&store, RecordType::LastSignInDate, &chrono::Local::now().format("%Y%m%d").to_string()).unwrap();
    let mut h = Harness::new(client, store);

    h.key(KeyCode::Down);
    h.key(KeyCode::Down);
    h.key(KeyCode::Enter);
    h.pump().await;
    assert_eq!(h.controller.navigation().top().node.menu_key(), "user_playlists_3");

    h.key(KeyCode::Enter);
    h.pump().await;
    assert_eq!(h.controller.navigation().top().node.menu_key(), "playlist_70");

    h.key(KeyCode::Down);
    h.key(KeyCode::Down);
    h.key(KeyCode::Enter);
    assert_eq!(h.played(), vec![9]);
    assert_eq!(h.controller.playback().playing_menu_key(), "playlist_70");

    h.key(KeyCode::Esc);
    h.key(KeyCode::Enter);
    h.pump().await;

    assert_eq!(h.controller.navigation().top().selected, 2);
    // sign-in already happened today
    assert_eq!(h.client.calls_to("/daily_signin"), 0);
}

#[tokio::test]
async fn back_cancels_pending_load() {
    let client = ScriptedClient::default().reply("/personal_fm", 200, songs(&[1]));
    let mut h = Harness::new(client, MemoryStore::new());

    h.key(KeyCode::Enter);
    h.key(KeyCode::Esc);
    assert!(!h.controller.navigation().is_loading());

    h.pump().await;
    assert_eq!(h.controller.navigation().depth(), 1);
}

#[tokio::test]
async fn startup_restores_records_independently() {
    let store = MemoryStore::new();
    store.set(RecordType::Volume, b"loud").unwrap();
    save(&store, RecordType::PlayMode, &PlayMode::SingleLoop).unwrap();
    let snapshot = SessionSnapshot {
        queue: vec![track(1), track(2)],
        current_index: Some(1),
        updated_at: None,
        menu_key: "playlist_9".into(),
    };
    save(&store, RecordType::PlaybackSnapshot, &snapshot).unwrap();

    let h = Harness::new(ScriptedClient::default(), store);
    let player = h.controller.playback();

    assert_eq!(player.volume(), 50);
    assert_eq!(player.mode(), PlayMode::SingleLoop);
    assert_eq!(player.queue(), snapshot.queue.as_slice());
    assert_eq!(player.current_index(), Some(1));
    assert_eq!(player.playing_menu_key(), RESTORED_MENU_KEY);
}

#[tokio::test]
async fn shutdown_flushes_final_state() {
    let client = ScriptedClient::default().reply("/personal_fm", 200, songs(&[1, 2]));
    let mut h = Harness::new(client, MemoryStore::new());

    h.key(KeyCode::Enter);
    h.pump().await;
    h.key(KeyCode::Enter);
    h.key(KeyCode::Char('n'));
    h.key(KeyCode::Char('+'));
    h.controller.shutdown().await;

    let stored: SessionSnapshot = load(h.store.as_ref(), RecordType::PlaybackSnapshot).unwrap();
    assert_eq!(stored, h.controller.playback().snapshot());
    assert_eq!(stored.current_index, Some(1));
    assert_eq!(load::<u8>(h.store.as_ref(), RecordType::Volume), Some(55));
    assert_eq!(load::<PlayMode>(h.store.as_ref(), RecordType::PlayMode), Some(PlayMode::IntelligentFm));
}

#[tokio::test]
async fn global_keys_work_in_both_modes() {
    let mut h = Harness::new(ScriptedClient::default(), MemoryStore::new());

    h.key(KeyCode::Char('m'));
    assert_eq!(h.controller.playback().mode(), PlayMode::Ordered);

    h.key(KeyCode::Tab);
    h.key(KeyCode::Char('m'));
    assert_eq!(h.controller.playback().mode(), PlayMode::SingleLoop);

    h.key(KeyCode::Char('-'));
    assert!(h.sink.calls.lock().unwrap().contains(&SinkCall::Volume(45)));

    h.key(KeyCode::Char('q'));
    assert!(h.controller.should_quit());
}

#[tokio::test]
async fn daily_sign_in_runs_once_and_records_date() {
    let client = ScriptedClient::default()
        .reply("/daily_signin", 200, json!({ "code": 200 }))
        .reply("/daily_signin", 200, json!({ "code": 200 }))
        .reply("/yunbei/sign", 200, json!({ "code": 200 }));
    let store = MemoryStore::new();
    save(&store, RecordType::UserIdentity, &User { id: 3, nickname: "me".into() }).unwrap();
    save(&store, RecordType::LastSignInDate, &"19700101".to_string()).unwrap();

    let mut h = Harness::new(client, store);
    h.pump().await;
    h.controller.shutdown().await;

    let today = chrono::Local::now().format("%Y%m%d").to_string();
    assert_eq!(load::<String>(h.store.as_ref(), RecordType::LastSignInDate), Some(today));
    assert_eq!(h.client.calls_to("/daily_signin"), 2);
    assert_eq!(h.client.calls_to("/yunbei/sign"), 1);
}

#[tokio::test]
async fn late_top_up_is_dropped_after_queue_replaced() {
    let client = ScriptedClient::default()
        .reply("/personal_fm", 200, songs(&[1, 2, 3]))
        .reply("/personal_fm", 200, songs(&[4, 5]))
        .reply(
            "/recommend/songs",
            200,
            json!({ "code": 200, "data": { "dailySongs": [{ "id": 10 }, { "id": 11 }] } }),
        );
    let mut h = Harness::new(client, MemoryStore::new());

    h.play_fm().await;
    h.key(KeyCode::Char('n'));
    h.key(KeyCode::Char('n'));
    h.key(KeyCode::Char('n'));
    let late = h.next_event().await;
    assert!(matches!(late, AppEvent::ToppedUp { .. }));

    // back to main, open Daily Recommend and play from it
    h.key(KeyCode::Esc);
    h.key(KeyCode::Down);
    h.key(KeyCode::Enter);
    h.pump().await;
    assert_eq!(h.controller.navigation().top().node.menu_key(), "daily_recommend");
    h.key(KeyCode::Enter);
    assert_eq!(h.queue_ids(), vec![10, 11]);

    h.controller.handle_event(late);

    let player = h.controller.playback();
    assert_eq!(h.queue_ids(), vec![10, 11]);
    assert_eq!(player.current_index(), Some(0));
    assert!(player.is_playing());
    assert!(!player.awaiting_top_up());
    assert_eq!(h.played(), vec![1, 2, 3, 10]);
}

#[tokio::test]
async fn failed_top_up_stops_and_keeps_queue() {
    let client = ScriptedClient::default()
        .reply("/personal_fm", 200, songs(&[1]))
        .reply("/personal_fm", 502, json!({ "code": 502 }));
    let mut h = Harness::new(client, MemoryStore::new());

    h.play_fm().await;
    h.key(KeyCode::Char('n'));
    h.pump().await;

    let player = h.controller.playback();
    assert_eq!(h.queue_ids(), vec![1]);
    assert_eq!(player.current_index(), Some(0));
    assert!(!player.is_playing());
    assert!(!player.awaiting_top_up());
    assert!(h.controller.notice().is_some());

    // another top-up is in flight; space must not replay the spent track
    h.key(KeyCode::Char('n'));
    assert!(h.controller.playback().awaiting_top_up());
    h.key(KeyCode::Char(' '));
    assert_eq!(h.played(), vec![1]);
    h.pump().await;
    assert_eq!(h.played(), vec![1]);
}

#[tokio::test]
async fn empty_top_up_stops_with_notice() {
    let client = ScriptedClient::default()
        .reply("/personal_fm", 200, songs(&[1, 2]))
        .reply("/personal_fm", 200, songs(&[]));
    let mut h = Harness::new(client, MemoryStore::new());

    h.play_fm().await;
    h.key(KeyCode::Char('n'));
    h.key(KeyCode::Char('n'));
    h.pump().await;

    let player = h.controller.playback();
    assert_eq!(h.queue_ids(), vec![1, 2]);
    assert_eq!(player.current_index(), Some(1));
    assert!(!player.is_playing());
    assert_eq!(h.controller.notice(), Some("FM returned no new tracks"));
    assert_eq!(h.played(), vec![1, 2]);
}

#[tokio::test]
async fn loading_more_fm_entries_extends_the_queue() {
    let client = ScriptedClient::default()
        .reply("/personal_fm", 200, songs(&[1, 2]))
        .reply("/personal_fm", 200, songs(&[3, 4]));
    let mut h = Harness::new(client, MemoryStore::new());

    h.play_fm().await;
    h.key(KeyCode::Down);
    h.key(KeyCode::Down);
    assert!(h.controller.navigation().is_loading());
    h.pump().await;

    assert_eq!(h.controller.navigation().top().node.items().len(), 4);
    assert_eq!(h.controller.navigation().top().selected, 2);
    assert_eq!(h.queue_ids(), vec![1, 2, 3, 4]);
    assert_eq!(h.controller.playback().current_index(), Some(0));
    assert_eq!(h.played(), vec![1]);
}
