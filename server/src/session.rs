//! The pursuit minigame state machine.
//!
//! A session is either idle or active. While active, a single
//! [`TickSchedule`] drives the pursuit engine; every reschedule replaces the
//! slot, which drops (and so cancels) the previous timer. One-shot callbacks
//! such as catch cooldown expiry and slow-down restore are posted to a
//! [`DeferredQueue`] and come back through the hub's event loop.

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::error::HubError;
use crate::pursuit::{Hunter, PursuitEngine};
use crate::registry::ConnectionRegistry;
use crate::utils::{get_timestamp, timer_period};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use shared::{
    Difficulty, GameCommand, HunterView, MapCatalog, Pickup, Position, ResultAction,
    ServerEvent, SessionUpdate,
};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Callbacks fired some time after they were armed.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// The player may be caught again
    CooldownExpired(String),
    /// End of a pickup slow-down; carries the period to go back to
    RestoreSpeed(Duration),
    /// Re-send hunter positions, used after a client connects
    SyncHunters,
}

/// Arms one-shot timers that post a [`Deferred`] back to the event loop.
/// Armed timers are never cancelled.
#[derive(Debug, Clone)]
pub struct DeferredQueue {
    tx: mpsc::UnboundedSender<Deferred>,
}

impl DeferredQueue {
    pub fn new(tx: mpsc::UnboundedSender<Deferred>) -> Self {
        Self { tx }
    }

    pub fn schedule(&self, delay: Duration, deferred: Deferred) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(deferred).is_err() {
                debug!("Event loop gone, dropping deferred callback");
            }
        });
    }
}

/// Periodic pursuit tick. The first tick fires one full period after
/// installation.
#[derive(Debug)]
pub struct TickSchedule {
    period: Duration,
    interval: Interval,
}

impl TickSchedule {
    pub fn new(period: Duration) -> Self {
        let period = timer_period(period);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { period, interval }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active,
}

/// Hunter as reported by the control plane, including its current target.
#[derive(Debug, Clone, Serialize)]
pub struct HunterStatus {
    pub id: String,
    pub position: Position,
    pub target: Option<String>,
    pub difficulty: Difficulty,
}

impl From<&Hunter> for HunterStatus {
    fn from(hunter: &Hunter) -> Self {
        Self {
            id: hunter.id.clone(),
            position: hunter.position,
            target: hunter.target.clone(),
            difficulty: hunter.difficulty,
        }
    }
}

/// Full session state, served by `GET /admin/zombie/state`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_active: bool,
    pub difficulty: Difficulty,
    pub current_map: String,
    #[serde(rename = "zombies")]
    pub hunters: Vec<HunterStatus>,
    pub tick_interval_ms: Option<u64>,
    pub recently_caught: Vec<String>,
}

/// Short session summary, served by `GET /admin/zombie/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub is_active: bool,
    pub difficulty: Difficulty,
    pub current_map: String,
    #[serde(rename = "zombies")]
    pub hunters: Vec<HunterStatus>,
    #[serde(rename = "zombieCount")]
    pub hunter_count: usize,
}

pub struct SessionController {
    phase: SessionPhase,
    difficulty: Difficulty,
    map: String,
    engine: PursuitEngine,
    schedule: Option<TickSchedule>,
    recently_caught: HashSet<String>,

    topology: MapCatalog,
    rng: StdRng,
    deferred: DeferredQueue,
    config: ServerConfig,
}

impl SessionController {
    pub fn new(config: ServerConfig, topology: MapCatalog, deferred: DeferredQueue) -> Self {
        Self::with_rng(config, topology, deferred, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: ServerConfig,
        topology: MapCatalog,
        deferred: DeferredQueue,
        rng: StdRng,
    ) -> Self {
        Self {
            phase: SessionPhase::Idle,
            difficulty: Difficulty::default(),
            map: config.default_map.clone(),
            engine: PursuitEngine::new(config.catch_distance),
            schedule: None,
            recently_caught: HashSet::new(),
            topology,
            rng,
            deferred,
            config,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn hunters(&self) -> &[Hunter] {
        self.engine.hunters()
    }

    /// Period of the installed tick schedule, if any.
    pub fn tick_period(&self) -> Option<Duration> {
        self.schedule.as_ref().map(TickSchedule::period)
    }

    pub fn is_on_cooldown(&self, player: &str) -> bool {
        self.recently_caught.contains(player)
    }

    /// Resolves at the next scheduled tick; never resolves when no schedule
    /// is installed.
    pub async fn next_tick(&mut self) {
        match self.schedule.as_mut() {
            Some(schedule) => {
                schedule.interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    fn install_schedule(&mut self, period: Duration) {
        info!("Pursuit tick every {}ms", period.as_millis());
        self.schedule = Some(TickSchedule::new(period));
    }

    /// Dispatches a `zombie_game_update` message.
    pub fn handle_update(&mut self, update: SessionUpdate, out: &Broadcaster) -> Result<(), HubError> {
        match update.action.as_deref() {
            Some("start") => {
                info!("Start requested by {:?}", update.player);
                self.request_start(update.difficulty, update.map, out);
                Ok(())
            }
            Some("stop") => {
                info!("Stop requested by {:?}", update.player);
                self.stop(out);
                Ok(())
            }
            Some("complete") => {
                self.report_result(update, out);
                Ok(())
            }
            Some(other) => Err(HubError::UnknownAction(other.to_string())),
            None => Err(HubError::UnknownAction("<missing>".to_string())),
        }
    }

    /// Starts from loosely typed request fields. A missing or zero level means
    /// easy; any other unsupported level also falls back to easy. A missing
    /// map means the default session map.
    pub fn request_start(
        &mut self,
        difficulty: Option<u8>,
        map: Option<String>,
        out: &Broadcaster,
    ) -> bool {
        let difficulty = match difficulty {
            None | Some(0) => Difficulty::default(),
            Some(level) => Difficulty::from_level(level).unwrap_or_else(|| {
                warn!("Unsupported difficulty {}, using default", level);
                Difficulty::default()
            }),
        };
        let map = map
            .filter(|map| !map.is_empty())
            .unwrap_or_else(|| self.config.default_map.clone());
        self.start(difficulty, &map, out)
    }

    /// Idle -> Active. Starting an active session only re-syncs hunters.
    /// Returns true when a new session was started.
    pub fn start(&mut self, difficulty: Difficulty, map: &str, out: &Broadcaster) -> bool {
        if self.is_active() {
            info!("Session already active, syncing hunters");
            self.sync(out);
            return false;
        }

        self.phase = SessionPhase::Active;
        self.difficulty = difficulty;
        self.map = map.to_string();
        self.engine.spawn(
            difficulty,
            map,
            &self.topology,
            &mut self.rng,
            self.config.spawn_attempts,
            self.config.spawn_fallback,
        );

        out.broadcast(&ServerEvent::command(GameCommand::Start {
            difficulty,
            map: self.map.clone(),
            hunters: self.engine.views(),
        }));
        self.install_schedule(difficulty.tick_interval());

        info!(
            "Session started on {} at difficulty {} with {} hunters",
            self.map,
            difficulty.level(),
            self.engine.hunters().len()
        );
        true
    }

    /// Active -> Idle. Stopping an idle session does nothing.
    /// Returns true when an active session was stopped.
    pub fn stop(&mut self, out: &Broadcaster) -> bool {
        if !self.is_active() {
            debug!("Stop ignored, session is idle");
            return false;
        }

        self.phase = SessionPhase::Idle;
        self.schedule = None;
        self.engine.clear();
        out.broadcast(&ServerEvent::command(GameCommand::Stop));
        info!("Session stopped");
        true
    }

    /// Broadcasts the full hunter batch while a session is active.
    pub fn sync(&self, out: &Broadcaster) {
        if !self.is_active() {
            return;
        }
        out.broadcast(&self.batch());
        debug!("Synced {} hunters", self.engine.hunters().len());
    }

    fn batch(&self) -> ServerEvent {
        ServerEvent::HunterBatch {
            hunters: self.engine.views(),
            map: self.map.clone(),
            difficulty: self.difficulty,
            timestamp: get_timestamp(),
        }
    }

    /// One pursuit step: move hunters, announce catches, then sync.
    pub fn on_tick(&mut self, registry: &ConnectionRegistry, out: &Broadcaster) {
        if !self.is_active() {
            self.schedule = None;
            return;
        }

        let players = registry.players_on(&self.map);
        let caught = self.engine.tick(
            &players,
            &self.map,
            &self.topology,
            &mut self.rng,
            &mut self.recently_caught,
        );

        for player in caught {
            out.broadcast(&ServerEvent::command(GameCommand::Caught {
                player: player.clone(),
            }));
            self.deferred
                .schedule(self.config.catch_cooldown, Deferred::CooldownExpired(player));
        }

        self.sync(out);
    }

    /// Echoes an item pickup and, while active, slows hunters down for a
    /// while.
    ///
    /// Overlapping pickups each arm their own restore; whichever fires last
    /// decides the period.
    pub fn on_pickup(&mut self, pickup: Pickup, out: &Broadcaster) {
        let player = pickup.player.clone();
        out.broadcast(&ServerEvent::Pickup(pickup));

        if !self.is_active() {
            debug!("Pickup by {:?} while idle, schedule untouched", player);
            return;
        }

        let base = self.difficulty.tick_interval();
        self.install_schedule(base + self.config.slowdown_penalty);
        out.broadcast(&ServerEvent::command(GameCommand::Slowed { player }));
        self.deferred
            .schedule(self.config.slowdown_duration, Deferred::RestoreSpeed(base));
    }

    /// Puts the tick back to `period` if a session is still running.
    pub fn restore_speed(&mut self, period: Duration, out: &Broadcaster) {
        if !self.is_active() || self.schedule.is_none() {
            return;
        }
        self.install_schedule(period);
        out.broadcast(&ServerEvent::command(GameCommand::SpeedRestored));
    }

    fn report_result(&self, update: SessionUpdate, out: &Broadcaster) {
        if !self.is_active() {
            debug!("Result from {:?} ignored, session is idle", update.player);
            return;
        }
        info!(
            "Player {:?} finished: survived={:?} score={:?}",
            update.player, update.survived, update.score
        );
        out.broadcast(&ServerEvent::PlayerResult {
            action: ResultAction::PlayerResult,
            player: update.player,
            survived: update.survived,
            time: update.time,
            score: update.score,
        });
    }

    pub fn handle_deferred(&mut self, deferred: Deferred, out: &Broadcaster) {
        match deferred {
            Deferred::CooldownExpired(player) => {
                self.recently_caught.remove(&player);
            }
            Deferred::RestoreSpeed(period) => self.restore_speed(period, out),
            Deferred::SyncHunters => self.sync(out),
        }
    }

    /// Arms the delayed hunter sync sent to newly connected clients.
    pub fn schedule_join_sync(&self) {
        if self.is_active() {
            self.deferred
                .schedule(self.config.join_sync_delay, Deferred::SyncHunters);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let recently_caught: BTreeSet<String> = self.recently_caught.iter().cloned().collect();
        SessionSnapshot {
            is_active: self.is_active(),
            difficulty: self.difficulty,
            current_map: self.map.clone(),
            hunters: self.engine.hunters().iter().map(HunterStatus::from).collect(),
            tick_interval_ms: self.tick_period().map(|period| period.as_millis() as u64),
            recently_caught: recently_caught.into_iter().collect(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            is_active: self.is_active(),
            difficulty: self.difficulty,
            current_map: self.map.clone(),
            hunters: self.engine.hunters().iter().map(HunterStatus::from).collect(),
            hunter_count: self.engine.hunters().len(),
        }
    }

    pub fn hunter_views(&self) -> Vec<HunterView> {
        self.engine.views()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shared::{MapTopology, DEFAULT_SESSION_MAP};

    struct Harness {
        session: SessionController,
        registry: ConnectionRegistry,
        out: Broadcaster,
        frames: mpsc::UnboundedReceiver<String>,
        deferred: mpsc::UnboundedReceiver<Deferred>,
    }

    impl Harness {
        fn new() -> Self {
            let (deferred_tx, deferred) = mpsc::unbounded_channel();
            let session = SessionController::with_rng(
                ServerConfig::default(),
                MapCatalog::with_builtin(),
                DeferredQueue::new(deferred_tx),
                StdRng::seed_from_u64(42),
            );
            let (tx, frames) = mpsc::unbounded_channel();
            let mut out = Broadcaster::new();
            out.register(1, tx);
            Self {
                session,
                registry: ConnectionRegistry::new(),
                out,
                frames,
                deferred,
            }
        }

        fn drain(&mut self) -> Vec<Value> {
            let mut events = Vec::new();
            while let Ok(frame) = self.frames.try_recv() {
                events.push(serde_json::from_str(&frame).unwrap());
            }
            events
        }
    }

    fn commands(events: &[Value]) -> Vec<String> {
        events
            .iter()
            .filter(|event| event["type"] == "zombie_game_command")
            .map(|event| event["command"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_hard_session() {
        let mut h = Harness::new();
        assert!(h.session.start(Difficulty::Hard, DEFAULT_SESSION_MAP, &h.out));

        assert!(h.session.is_active());
        assert_eq!(h.session.hunters().len(), 6);
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(500)));
        let catalog = MapCatalog::with_builtin();
        for hunter in h.session.hunters() {
            assert!(catalog.is_traversable(
                DEFAULT_SESSION_MAP,
                hunter.position.x as i32,
                hunter.position.y as i32
            ));
        }

        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["command"], "start");
        assert_eq!(events[0]["difficulty"], 3);
        assert_eq!(events[0]["zombies"].as_array().unwrap().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_only_syncs() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Hard, DEFAULT_SESSION_MAP, &h.out);
        let before = h.session.hunter_views();
        h.drain();

        assert!(!h.session.start(Difficulty::Easy, "elsewhere", &h.out));
        assert_eq!(h.session.hunter_views(), before);
        assert_eq!(h.session.difficulty(), Difficulty::Hard);

        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "zombie_position_batch");
        assert_eq!(events[0]["zombies"].as_array().unwrap().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Hard, DEFAULT_SESSION_MAP, &h.out);

        let started = Instant::now();
        h.session.next_tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_while_idle() {
        let mut h = Harness::new();
        let mut tick = tokio_test::task::spawn(h.session.next_tick());
        tokio_test::assert_pending!(tick.poll());
        tokio::time::advance(Duration::from_secs(10)).await;
        tokio_test::assert_pending!(tick.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_everything() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Medium, DEFAULT_SESSION_MAP, &h.out);
        h.drain();

        assert!(h.session.stop(&h.out));
        assert_eq!(h.session.phase(), SessionPhase::Idle);
        assert!(h.session.hunters().is_empty());
        assert_eq!(h.session.tick_period(), None);
        assert_eq!(commands(&h.drain()), vec!["stop"]);

        assert!(!h.session.stop(&h.out));
        assert!(h.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_broadcasts_batch() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Easy, DEFAULT_SESSION_MAP, &h.out);
        h.drain();

        h.session.on_tick(&h.registry, &h.out);
        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "zombie_position_batch");
        assert_eq!(events[0]["map"], DEFAULT_SESSION_MAP);
        assert_eq!(events[0]["difficulty"], 1);
        assert!(events[0]["timestamp"].as_u64().unwrap() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catch_cooldown_cycle() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Easy, "arena", &h.out);
        let hunter = h.session.hunters()[0].position;
        h.registry.join("p1");
        h.registry.set_local("p1", hunter, "arena");
        h.drain();

        h.session.on_tick(&h.registry, &h.out);
        assert_eq!(commands(&h.drain()), vec!["caught"]);
        assert!(h.session.is_on_cooldown("p1"));

        h.session.on_tick(&h.registry, &h.out);
        assert!(commands(&h.drain()).is_empty());

        let armed = Instant::now();
        let deferred = h.deferred.recv().await.unwrap();
        assert_eq!(armed.elapsed(), Duration::from_millis(5000));
        assert_eq!(deferred, Deferred::CooldownExpired("p1".to_string()));

        h.session.handle_deferred(deferred, &h.out);
        assert!(!h.session.is_on_cooldown("p1"));
        h.session.on_tick(&h.registry, &h.out);
        assert_eq!(commands(&h.drain()), vec!["caught"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pickup_slows_then_restores() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Hard, DEFAULT_SESSION_MAP, &h.out);
        h.drain();

        h.session.on_pickup(
            Pickup {
                player: Some(json!("p1")),
                score: Some(json!(5)),
                ..Default::default()
            },
            &h.out,
        );
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(800)));
        let events = h.drain();
        assert_eq!(events[0], json!({"type": "zombie_game_food", "player": "p1", "score": 5}));
        assert_eq!(commands(&events), vec!["zombie_slowed"]);

        let started = Instant::now();
        h.session.next_tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(800));

        let deferred = h.deferred.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert_eq!(deferred, Deferred::RestoreSpeed(Duration::from_millis(500)));

        h.session.handle_deferred(deferred, &h.out);
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(500)));
        assert_eq!(commands(&h.drain()), vec!["zombie_speed_normal"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_pickups_restore_base_speed() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Hard, DEFAULT_SESSION_MAP, &h.out);
        let started = Instant::now();

        h.session.on_pickup(Pickup::default(), &h.out);
        tokio::time::sleep(Duration::from_secs(2)).await;
        h.session.on_pickup(Pickup::default(), &h.out);
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(800)));
        h.drain();

        // First restore lands while the second slow-down is still running
        let deferred = h.deferred.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        h.session.handle_deferred(deferred, &h.out);
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(500)));
        assert_eq!(commands(&h.drain()), vec!["zombie_speed_normal"]);

        // Only the restored schedule is left ticking
        h.session.next_tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
        h.session.next_tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(4000));

        let deferred = h.deferred.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
        assert_eq!(deferred, Deferred::RestoreSpeed(Duration::from_millis(500)));
        h.session.handle_deferred(deferred, &h.out);
        assert_eq!(h.session.tick_period(), Some(Duration::from_millis(500)));
        assert!(h.deferred.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_after_stop_is_ignored() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Medium, DEFAULT_SESSION_MAP, &h.out);
        h.session.on_pickup(Pickup::default(), &h.out);
        h.session.stop(&h.out);
        h.drain();

        let deferred = h.deferred.recv().await.unwrap();
        h.session.handle_deferred(deferred, &h.out);
        assert_eq!(h.session.tick_period(), None);
        assert!(h.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pickup_while_idle_is_echo_only() {
        let mut h = Harness::new();
        h.session.on_pickup(Pickup::default(), &h.out);

        let events = h.drain();
        assert_eq!(events, vec![json!({"type": "zombie_game_food"})]);
        assert_eq!(h.session.tick_period(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_update_actions() {
        let mut h = Harness::new();
        let start = SessionUpdate {
            action: Some("start".into()),
            difficulty: Some(2),
            ..Default::default()
        };
        h.session.handle_update(start, &h.out).unwrap();
        assert_eq!(h.session.difficulty(), Difficulty::Medium);
        assert_eq!(h.session.map(), DEFAULT_SESSION_MAP);
        h.drain();

        let complete = SessionUpdate {
            action: Some("complete".into()),
            player: Some(json!("p1")),
            survived: Some(json!(false)),
            time: Some(json!(12.5)),
            score: Some(json!(40)),
            ..Default::default()
        };
        h.session.handle_update(complete, &h.out).unwrap();
        let events = h.drain();
        assert_eq!(events[0]["action"], "player_result");
        assert_eq!(events[0]["survived"], false);
        assert!(h.session.is_active());

        let unknown = SessionUpdate {
            action: Some("dance".into()),
            ..Default::default()
        };
        assert!(matches!(
            h.session.handle_update(unknown, &h.out),
            Err(HubError::UnknownAction(action)) if action == "dance"
        ));

        let stop = SessionUpdate {
            action: Some("stop".into()),
            ..Default::default()
        };
        h.session.handle_update(stop, &h.out).unwrap();
        assert!(!h.session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_difficulty_falls_back() {
        let mut h = Harness::new();
        let start = SessionUpdate {
            action: Some("start".into()),
            difficulty: Some(9),
            map: Some("lab".into()),
            ..Default::default()
        };
        h.session.handle_update(start, &h.out).unwrap();
        assert_eq!(h.session.difficulty(), Difficulty::Easy);
        assert_eq!(h.session.hunters().len(), 2);
        assert_eq!(h.session.map(), "lab");
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_and_summary() {
        let mut h = Harness::new();
        h.session.start(Difficulty::Medium, DEFAULT_SESSION_MAP, &h.out);

        let snapshot = serde_json::to_value(h.session.snapshot()).unwrap();
        assert_eq!(snapshot["isActive"], true);
        assert_eq!(snapshot["tickIntervalMs"], 800);
        assert_eq!(snapshot["zombies"].as_array().unwrap().len(), 4);

        let summary = serde_json::to_value(h.session.summary()).unwrap();
        assert_eq!(summary["zombieCount"], 4);
        assert_eq!(summary["currentMap"], DEFAULT_SESSION_MAP);
    }
}
