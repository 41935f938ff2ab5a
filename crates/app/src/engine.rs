//! Routine engine — ties the store, the scheduler and the executor together.
//!
//! Timer ticks and voice notifications both end up as a *firing*: a spawned
//! task holding one routine snapshot. Before running any action it checks
//! that the snapshot is still the stored, enabled version; an edit, a
//! disable or a delete in between drops the firing. Nothing in the engine
//! waits for a firing to finish.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use soundboard_domain::error::SoundboardError;
use soundboard_domain::facts::Facts;
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::presence::{PresentMember, VoicePresence};
use soundboard_domain::routine::Routine;
use soundboard_domain::voice::VoiceEvent;

use crate::executor::{ActionExecutor, ExecutionResult, FiringContext};
use crate::ports::{Clock, Messenger, RoutineRepository, SoundDispatcher};
use crate::scheduler::{Tick, TriggerScheduler};
use crate::services::routine_service::RoutineService;

struct EngineInner<R, S, M, C> {
    store: RoutineService<R>,
    scheduler: TriggerScheduler,
    executor: ActionExecutor<S, M>,
    clock: C,
    presence: Arc<RwLock<VoicePresence>>,
    ticks: Mutex<Option<mpsc::UnboundedReceiver<Tick>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Facade over the routine store, scheduler and executor.
///
/// Cheap to clone; clones share the same state.
pub struct RoutineEngine<R, S, M, C> {
    inner: Arc<EngineInner<R, S, M, C>>,
}

impl<R, S, M, C> Clone for RoutineEngine<R, S, M, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S, M, C> RoutineEngine<R, S, M, C>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    pub fn new(repo: R, sounds: S, messenger: M, clock: C) -> Self {
        let (scheduler, ticks) = TriggerScheduler::new();
        let presence = Arc::new(RwLock::new(VoicePresence::new()));
        Self {
            inner: Arc::new(EngineInner {
                store: RoutineService::new(repo),
                scheduler,
                executor: ActionExecutor::new(sounds, messenger, Arc::clone(&presence)),
                clock,
                presence,
                ticks: Mutex::new(Some(ticks)),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The underlying routine store, for reads.
    #[must_use]
    pub fn routines(&self) -> &RoutineService<R> {
        &self.inner.store
    }

    #[must_use]
    pub fn scheduler(&self) -> &TriggerScheduler {
        &self.inner.scheduler
    }

    /// Load every guild from persistence, arm timers and start consuming
    /// timer ticks. Returns the number of routines loaded.
    ///
    /// A routine whose timer cannot be armed is logged and left idle; the
    /// others still start.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading fails.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<usize, SoundboardError> {
        let mut loaded = 0;
        for guild_id in self.inner.store.persisted_guilds().await? {
            for routine in self.inner.store.load_guild(&guild_id).await? {
                if let Err(err) = self.inner.scheduler.sync(&routine) {
                    tracing::warn!(routine_id = %routine.id, %err, "timer not armed");
                }
                loaded += 1;
            }
        }
        let receiver = self
            .inner
            .ticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(receiver) = receiver {
            let handle = tokio::spawn(Self::pump_ticks(Arc::downgrade(&self.inner), receiver));
            self.track(handle);
        }
        tracing::info!(
            routines = loaded,
            timers = self.inner.scheduler.armed_count(),
            "routine engine started"
        );
        Ok(loaded)
    }

    /// Store a new routine and arm it if it is an enabled timer.
    ///
    /// # Errors
    ///
    /// Propagates store errors (validation, duplicate, storage).
    pub async fn create(&self, routine: Routine) -> Result<Arc<Routine>, SoundboardError> {
        let routine = self.inner.store.create(routine).await?;
        self.inner.scheduler.sync(&routine)?;
        Ok(routine)
    }

    /// Replace a routine. Its timer, if any, restarts from a full interval.
    ///
    /// # Errors
    ///
    /// Propagates store errors (not found, validation, storage).
    pub async fn update(&self, routine: Routine) -> Result<Arc<Routine>, SoundboardError> {
        let routine = self.inner.store.update(routine).await?;
        self.inner.scheduler.sync(&routine)?;
        Ok(routine)
    }

    /// Delete a routine and cancel its timer. A run already executing
    /// actions finishes.
    ///
    /// # Errors
    ///
    /// Propagates store errors (not found, storage).
    pub async fn delete(
        &self,
        guild_id: &GuildId,
        id: RoutineId,
    ) -> Result<Arc<Routine>, SoundboardError> {
        let removed = self.inner.store.delete(guild_id, id).await?;
        self.inner.scheduler.disarm(id);
        Ok(removed)
    }

    /// Flip a routine's `enabled` flag and re-sync its timer.
    ///
    /// # Errors
    ///
    /// Propagates store errors (not found, validation, storage).
    pub async fn toggle(
        &self,
        guild_id: &GuildId,
        id: RoutineId,
    ) -> Result<Arc<Routine>, SoundboardError> {
        let routine = self.inner.store.toggle(guild_id, id).await?;
        self.inner.scheduler.sync(&routine)?;
        Ok(routine)
    }

    /// Update presence and fire every enabled routine of the guild that
    /// listens to this kind of event and whose condition holds.
    ///
    /// Returns the ids of the routines dispatched. Their actions run on
    /// spawned tasks.
    pub fn handle_voice_event(&self, event: &VoiceEvent) -> Vec<RoutineId> {
        self.inner
            .presence
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(event);

        let facts = event.facts(Facts::at(self.inner.clock.now()));
        let mut dispatched = Vec::new();
        for routine in self.inner.store.matching(&event.guild_id, event.kind) {
            if !routine.condition_holds(&facts) {
                tracing::debug!(routine_id = %routine.id, "condition not met");
                continue;
            }
            dispatched.push(routine.id);
            let context = FiringContext {
                guild_id: event.guild_id.clone(),
                facts: facts.clone(),
            };
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                inner.run_if_current(&routine, &context).await;
            });
        }
        if !dispatched.is_empty() {
            tracing::info!(
                guild_id = %event.guild_id,
                kind = %event.kind,
                count = dispatched.len(),
                "voice event dispatched routines"
            );
        }
        dispatched
    }

    /// Consume voice events from a bus subscription until it closes or the
    /// engine shuts down.
    pub fn listen(&self, mut receiver: broadcast::Receiver<VoiceEvent>) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        engine.handle_voice_event(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "voice listener lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("voice bus closed, listener stopped");
                        break;
                    }
                }
            }
        });
        self.track(handle);
    }

    /// Cancel every timer and background task. Runs already executing
    /// actions are left to finish.
    pub fn shutdown(&self) {
        self.inner.scheduler.shutdown();
        let tasks: Vec<_> = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in &tasks {
            task.abort();
        }
        tracing::info!("routine engine stopped");
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    async fn pump_ticks(
        inner: std::sync::Weak<EngineInner<R, S, M, C>>,
        mut receiver: mpsc::UnboundedReceiver<Tick>,
    ) {
        while let Some(tick) = receiver.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            tokio::spawn(async move {
                let Tick {
                    guild_id,
                    routine_id,
                    generation,
                    permit,
                } = tick;
                inner.fire_timer(&guild_id, routine_id, generation).await;
                // the next tick may start a run from here on
                drop(permit);
            });
        }
    }
}

impl<R, S, M, C> EngineInner<R, S, M, C>
where
    R: RoutineRepository,
    S: SoundDispatcher,
    M: Messenger,
    C: Clock,
{
    /// Snapshot of a routine that may still fire.
    fn active(&self, guild_id: &GuildId, id: RoutineId) -> Option<Arc<Routine>> {
        self.store
            .get(guild_id, id)
            .ok()
            .filter(|routine| routine.enabled)
    }

    /// Whether `snapshot` is still the stored version of an enabled routine.
    fn is_current(&self, snapshot: &Arc<Routine>) -> bool {
        self.active(&snapshot.guild_id, snapshot.id)
            .is_some_and(|stored| Arc::ptr_eq(&stored, snapshot))
    }

    async fn run_if_current(
        &self,
        routine: &Arc<Routine>,
        context: &FiringContext,
    ) -> Option<ExecutionResult> {
        if !self.is_current(routine) {
            tracing::debug!(
                routine_id = %routine.id,
                "routine changed, disabled or gone before firing"
            );
            return None;
        }
        Some(self.executor.run(routine, context).await)
    }

    /// Find the context a timer firing runs in: the first present member
    /// whose facts satisfy the condition, or, with nobody present, the
    /// clock alone.
    fn timer_context(&self, routine: &Routine) -> Option<FiringContext> {
        let clock = Facts::at(self.clock.now());
        let members: Vec<PresentMember> = self
            .presence
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .members(&routine.guild_id);
        let facts = if members.is_empty() {
            Some(clock).filter(|facts| routine.condition_holds(facts))
        } else {
            members
                .iter()
                .map(|member| member.facts(clock.clone()))
                .find(|facts| routine.condition_holds(facts))
        };
        facts.map(|facts| FiringContext {
            guild_id: routine.guild_id.clone(),
            facts,
        })
    }

    async fn fire_timer(
        &self,
        guild_id: &GuildId,
        routine_id: RoutineId,
        generation: u64,
    ) -> Option<ExecutionResult> {
        if !self.scheduler.is_current(routine_id, generation) {
            tracing::debug!(%routine_id, "stale tick from a previous arming dropped");
            return None;
        }
        let Some(routine) = self
            .active(guild_id, routine_id)
            .filter(|routine| routine.is_timer())
        else {
            tracing::debug!(%routine_id, "routine gone, disabled or no longer a timer");
            return None;
        };
        let Some(context) = self.timer_context(&routine) else {
            tracing::debug!(%routine_id, "condition not met for any present member");
            return None;
        };
        tracing::debug!(%routine_id, "timer fired");
        Some(self.executor.run(&routine, &context).await)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{NaiveDate, NaiveDateTime};
    use soundboard_domain::id::{ChannelId, RoleId, UserId};
    use soundboard_domain::routine::{Action, Atom, Condition, Trigger};
    use soundboard_domain::voice::VoiceEventKind;

    use super::*;
    use crate::clock::FixedClock;
    use crate::executor::tests::RecordingDispatcher;
    use crate::services::routine_service::tests::{InMemoryRoutineRepo, guild, on_join};
    use crate::ports::VoiceEventPublisher;
    use crate::voice_bus::InProcessVoiceBus;

    type TestEngine = RoutineEngine<
        Arc<InMemoryRoutineRepo>,
        Arc<RecordingDispatcher>,
        Arc<RecordingDispatcher>,
        Arc<FixedClock>,
    >;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn engine_with(
        repo: InMemoryRoutineRepo,
    ) -> (TestEngine, Arc<RecordingDispatcher>, Arc<FixedClock>) {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let clock = Arc::new(FixedClock::new(noon()));
        let engine = RoutineEngine::new(
            Arc::new(repo),
            Arc::clone(&dispatcher),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
        );
        (engine, dispatcher, clock)
    }

    fn engine() -> (TestEngine, Arc<RecordingDispatcher>, Arc<FixedClock>) {
        engine_with(InMemoryRoutineRepo::default())
    }

    fn timer(name: &str, secs: u64, actions: Vec<Action>) -> Routine {
        Routine::builder()
            .guild_id(guild())
            .name(name)
            .trigger(Trigger::timer(secs).unwrap())
            .actions(actions)
            .build()
            .unwrap()
    }

    fn voice(kind: VoiceEventKind, user: &str, channel: &str) -> VoiceEvent {
        VoiceEvent {
            guild_id: guild(),
            channel_id: ChannelId::new(channel).unwrap(),
            user_id: UserId::new(user).unwrap(),
            role_ids: vec![],
            kind,
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs)).await;
        settle().await;
    }

    #[tokio::test]
    async fn should_fire_matching_event_routine_in_members_channel() {
        let (engine, dispatcher, _) = engine();
        let routine = engine.create(on_join("Greet")).await.unwrap();

        let dispatched = engine.handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"));
        settle().await;

        assert_eq!(dispatched, vec![routine.id]);
        let played = dispatcher.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].1.as_ref().map(ChannelId::as_str), Some("vc1"));
    }

    #[tokio::test]
    async fn should_ignore_other_event_kinds_and_guilds() {
        let (engine, dispatcher, _) = engine();
        engine.create(on_join("Greet")).await.unwrap();

        assert!(engine
            .handle_voice_event(&voice(VoiceEventKind::Leave, "7", "vc1"))
            .is_empty());
        let mut elsewhere = voice(VoiceEventKind::Join, "7", "vc1");
        elsewhere.guild_id = GuildId::new("999").unwrap();
        assert!(engine.handle_voice_event(&elsewhere).is_empty());
        settle().await;
        assert!(dispatcher.sounds().is_empty());
    }

    #[tokio::test]
    async fn should_skip_event_routine_whose_condition_fails() {
        let (engine, dispatcher, _) = engine();
        let mut routine = on_join("Admins only");
        routine.condition = Some(
            Condition::all([Atom::Role {
                id: RoleId::new("admin").unwrap(),
            }])
            .unwrap(),
        );
        engine.create(routine).await.unwrap();

        assert!(engine
            .handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"))
            .is_empty());

        let mut admin = voice(VoiceEventKind::Join, "8", "vc1");
        admin.role_ids = vec![RoleId::new("admin").unwrap()];
        assert_eq!(engine.handle_voice_event(&admin).len(), 1);
        settle().await;
        assert_eq!(dispatcher.sounds(), vec!["hello"]);
    }

    #[tokio::test]
    async fn should_never_fire_disabled_routine() {
        let (engine, dispatcher, _) = engine();
        let mut routine = on_join("Off");
        routine.enabled = false;
        engine.create(routine).await.unwrap();

        assert!(engine
            .handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"))
            .is_empty());
        settle().await;
        assert!(dispatcher.sounds().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_timer_routine_every_interval_after_start() {
        let routine = timer("Chime", 10, vec![Action::play("chime")]);
        let (engine, dispatcher, _) = engine_with(InMemoryRoutineRepo::with(vec![routine]));
        assert_eq!(engine.start().await.unwrap(), 1);
        assert_eq!(engine.scheduler().armed_count(), 1);

        advance(9).await;
        assert!(dispatcher.sounds().is_empty());
        advance(1).await;
        assert_eq!(dispatcher.sounds(), vec!["chime"]);
        advance(10).await;
        assert_eq!(dispatcher.sounds().len(), 2);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_same_interval_timers_independently_of_waits() {
        let (engine, dispatcher, _) = engine();
        engine.start().await.unwrap();
        engine
            .create(timer(
                "Slow",
                5,
                vec![Action::play("slow-1"), Action::wait(3.0), Action::play("slow-2")],
            ))
            .await
            .unwrap();
        engine
            .create(timer("Fast", 5, vec![Action::play("fast")]))
            .await
            .unwrap();

        advance(5).await;
        let mut sounds = dispatcher.sounds();
        sounds.sort();
        assert_eq!(sounds, vec!["fast", "slow-1"]);

        advance(3).await;
        assert!(dispatcher.sounds().contains(&"slow-2".to_string()));
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_overlapping_ticks_of_a_long_run() {
        let (engine, dispatcher, _) = engine();
        engine.start().await.unwrap();
        engine
            .create(timer(
                "Long",
                2,
                vec![Action::play("start"), Action::wait(5.0), Action::play("end")],
            ))
            .await
            .unwrap();

        // tick at 2s starts the run; ticks at 4s and 6s are skipped
        advance(2).await;
        advance(2).await;
        advance(2).await;
        assert_eq!(dispatcher.sounds(), vec!["start"]);
        // run ends at 7s, next accepted tick at 8s
        advance(1).await;
        assert_eq!(dispatcher.sounds(), vec!["start", "end"]);
        advance(1).await;
        assert_eq!(dispatcher.sounds(), vec!["start", "end", "start"]);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_let_inflight_run_finish_but_stop_future_firings_on_delete() {
        let (engine, dispatcher, _) = engine();
        engine.start().await.unwrap();
        let routine = engine
            .create(timer(
                "Doomed",
                5,
                vec![Action::play("a"), Action::wait(2.0), Action::play("b")],
            ))
            .await
            .unwrap();

        advance(5).await;
        assert_eq!(dispatcher.sounds(), vec!["a"]);
        engine.delete(&guild(), routine.id).await.unwrap();
        assert_eq!(engine.scheduler().armed_count(), 0);

        advance(2).await;
        assert_eq!(dispatcher.sounds(), vec!["a", "b"]);
        advance(20).await;
        assert_eq!(dispatcher.sounds(), vec!["a", "b"]);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_full_interval_after_toggle_off_and_on() {
        let (engine, dispatcher, _) = engine();
        engine.start().await.unwrap();
        let routine = engine
            .create(timer("Chime", 10, vec![Action::play("chime")]))
            .await
            .unwrap();

        advance(7).await;
        engine.toggle(&guild(), routine.id).await.unwrap();
        advance(5).await;
        assert!(dispatcher.sounds().is_empty());

        engine.toggle(&guild(), routine.id).await.unwrap();
        advance(9).await;
        assert!(dispatcher.sounds().is_empty());
        advance(1).await;
        assert_eq!(dispatcher.sounds(), vec!["chime"]);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_evaluate_timer_condition_against_present_members() {
        let (engine, dispatcher, _) = engine();
        engine.start().await.unwrap();
        let mut routine = timer("For 42", 5, vec![Action::play("hi")]);
        routine.condition = Some(
            Condition::all([Atom::User {
                id: UserId::new("42").unwrap(),
            }])
            .unwrap(),
        );
        engine.create(routine).await.unwrap();

        // nobody present: the user atom has no fact to match
        advance(5).await;
        assert!(dispatcher.sounds().is_empty());

        engine.handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"));
        engine.handle_voice_event(&voice(VoiceEventKind::Join, "42", "vc2"));
        advance(5).await;
        let played = dispatcher.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].1.as_ref().map(ChannelId::as_str), Some("vc2"));
        drop(played);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_context_free_timer_with_nobody_present() {
        let (engine, dispatcher, clock) = engine();
        engine.start().await.unwrap();
        let mut routine = timer("Evening", 5, vec![Action::play("bell")]);
        routine.condition = Some(
            Condition::all([Atom::Time {
                range: "18:00-23:00".parse().unwrap(),
            }])
            .unwrap(),
        );
        engine.create(routine).await.unwrap();

        advance(5).await;
        assert!(dispatcher.sounds().is_empty());

        clock.set(noon() + chrono::TimeDelta::hours(7));
        advance(5).await;
        assert_eq!(dispatcher.sounds(), vec!["bell"]);
        engine.shutdown();
    }

    #[tokio::test]
    async fn should_process_events_from_voice_bus() {
        let (engine, dispatcher, _) = engine();
        engine.create(on_join("Greet")).await.unwrap();
        let bus = InProcessVoiceBus::new(16);
        engine.listen(bus.subscribe());

        bus.publish(voice(VoiceEventKind::Join, "7", "vc1"))
            .await
            .unwrap();
        settle().await;

        assert_eq!(dispatcher.sounds(), vec!["hello"]);
        engine.shutdown();
    }

    #[tokio::test]
    async fn should_not_run_event_firing_for_routine_deleted_before_it_starts() {
        let (engine, dispatcher, _) = engine();
        let routine = engine.create(on_join("Greet")).await.unwrap();

        let dispatched = engine.handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"));
        assert_eq!(dispatched.len(), 1);
        // spawned firing has not been polled yet on this single thread
        engine.delete(&guild(), routine.id).await.unwrap();
        settle().await;

        assert!(dispatcher.sounds().is_empty());
    }

    #[tokio::test]
    async fn should_drop_event_firing_when_routine_is_updated_before_it_runs() {
        let (engine, dispatcher, _) = engine();
        let mut first = on_join("Greet 7");
        first.condition = Some(
            Condition::all([Atom::User {
                id: UserId::new("7").unwrap(),
            }])
            .unwrap(),
        );
        let first = engine.create(first).await.unwrap();

        let dispatched = engine.handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"));
        assert_eq!(dispatched, vec![first.id]);

        let mut second = Routine::clone(&first);
        second.trigger = Trigger::event(VoiceEventKind::Leave);
        second.condition = Some(
            Condition::all([Atom::User {
                id: UserId::new("8").unwrap(),
            }])
            .unwrap(),
        );
        second.actions = vec![Action::play("leave-only")];
        engine.update(second).await.unwrap();
        settle().await;

        assert!(dispatcher.sounds().is_empty());
    }

    #[tokio::test]
    async fn should_run_snapshot_matched_by_the_event() {
        let (engine, dispatcher, _) = engine();
        engine.create(on_join("Greet")).await.unwrap();
        let other = engine.create(on_join("Other")).await.unwrap();

        engine.handle_voice_event(&voice(VoiceEventKind::Join, "7", "vc1"));
        // editing a sibling leaves this firing alone
        let mut renamed = Routine::clone(&other);
        renamed.name = "Renamed".into();
        engine.update(renamed).await.unwrap();
        settle().await;

        assert_eq!(dispatcher.sounds(), vec!["hello"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_drop_tick_queued_before_toggle_off_and_on() {
        let (engine, dispatcher, _) = engine();
        // armed before start, so its ticks wait in the channel
        let routine = engine
            .create(timer("Chime", 10, vec![Action::play("chime")]))
            .await
            .unwrap();
        advance(10).await;

        engine.toggle(&guild(), routine.id).await.unwrap();
        engine.toggle(&guild(), routine.id).await.unwrap();
        engine.start().await.unwrap();
        settle().await;
        assert!(dispatcher.sounds().is_empty());

        advance(10).await;
        assert_eq!(dispatcher.sounds(), vec!["chime"]);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_drop_tick_queued_before_timer_became_event_routine() {
        let (engine, dispatcher, _) = engine();
        let routine = engine
            .create(timer("Chime", 10, vec![Action::play("chime")]))
            .await
            .unwrap();
        advance(10).await;

        let mut greeter = Routine::clone(&routine);
        greeter.trigger = Trigger::event(VoiceEventKind::Join);
        engine.update(greeter).await.unwrap();
        engine.start().await.unwrap();
        advance(30).await;

        assert!(dispatcher.sounds().is_empty());
        assert!(!engine.scheduler().is_armed(routine.id));
        engine.shutdown();
    }
}
