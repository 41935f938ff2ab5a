//! Trigger scheduler — one recurring timer task per enabled timer routine.
//!
//! Each armed routine gets its own tokio task that ticks every interval,
//! the first tick one full interval after arming. Ticks are handed to the
//! consumer over a channel together with a [`RunPermit`]; while a permit for
//! a routine is alive, further ticks of that routine are skipped.
//!
//! Every arming gets a fresh generation number carried by its ticks. A tick
//! already queued when its routine is disarmed or re-armed is stale, and
//! [`TriggerScheduler::is_current`] tells the consumer to drop it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use soundboard_domain::error::SchedulerError;
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::routine::Routine;

/// A timer fired for a routine.
#[derive(Debug)]
pub struct Tick {
    pub guild_id: GuildId,
    pub routine_id: RoutineId,
    /// Arming this tick belongs to.
    pub generation: u64,
    /// Hold for as long as the firing runs.
    pub permit: RunPermit,
}

/// Per-routine run tokens.
#[derive(Debug, Clone, Default)]
struct RunTokens(Arc<Mutex<HashSet<RoutineId>>>);

impl RunTokens {
    fn try_acquire(&self, routine_id: RoutineId) -> Option<RunPermit> {
        let mut busy = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        busy.insert(routine_id).then(|| RunPermit {
            routine_id,
            tokens: self.clone(),
        })
    }

    fn is_busy(&self, routine_id: RoutineId) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&routine_id)
    }
}

/// Proof that a tick-started firing of a routine is in progress. Dropping it
/// lets the next tick through.
#[derive(Debug)]
pub struct RunPermit {
    routine_id: RoutineId,
    tokens: RunTokens,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.tokens
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.routine_id);
    }
}

struct ArmedTimer {
    handle: JoinHandle<()>,
    generation: u64,
}

/// Owns the timer tasks of every armed routine.
pub struct TriggerScheduler {
    timers: Mutex<HashMap<RoutineId, ArmedTimer>>,
    tokens: RunTokens,
    ticks: mpsc::UnboundedSender<Tick>,
    generations: AtomicU64,
}

impl TriggerScheduler {
    /// Create a scheduler and the receiving end of its ticks.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (ticks, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            timers: Mutex::new(HashMap::new()),
            tokens: RunTokens::default(),
            ticks,
            generations: AtomicU64::new(0),
        };
        (scheduler, receiver)
    }

    /// Start (or restart) the timer of a timer routine. Any previous timer
    /// of the routine is cancelled, so the next tick is one full interval
    /// from now.
    ///
    /// Returns `false` without arming when the routine has no timer.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] outside a tokio runtime and
    /// [`SchedulerError::IntervalOverflow`] when the first tick cannot be
    /// represented on the clock.
    pub fn arm(&self, routine: &Routine) -> Result<bool, SchedulerError> {
        let Some(period) = routine.trigger.interval() else {
            return Ok(false);
        };
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| SchedulerError::NoRuntime(routine.id.to_string()))?;

        let guild_id = routine.guild_id.clone();
        let routine_id = routine.id;
        let first = Instant::now()
            .checked_add(period)
            .ok_or_else(|| SchedulerError::IntervalOverflow(routine.id.to_string()))?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let tokens = self.tokens.clone();
        let ticks = self.ticks.clone();
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(permit) = tokens.try_acquire(routine_id) else {
                    tracing::debug!(%routine_id, "previous firing still running, tick skipped");
                    continue;
                };
                let tick = Tick {
                    guild_id: guild_id.clone(),
                    routine_id,
                    generation,
                    permit,
                };
                if ticks.send(tick).is_err() {
                    tracing::debug!(%routine_id, "tick receiver gone, timer stopped");
                    break;
                }
            }
        });

        let previous = self
            .lock_timers()
            .insert(routine_id, ArmedTimer { handle, generation });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        tracing::debug!(%routine_id, interval_secs = period.as_secs(), "timer armed");
        Ok(true)
    }

    /// Cancel a routine's timer. Returns whether one was armed.
    pub fn disarm(&self, routine_id: RoutineId) -> bool {
        let removed = self.lock_timers().remove(&routine_id);
        match removed {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(%routine_id, "timer disarmed");
                true
            }
            None => false,
        }
    }

    /// Arm an enabled timer routine, disarm anything else.
    ///
    /// # Errors
    ///
    /// Same as [`TriggerScheduler::arm`].
    pub fn sync(&self, routine: &Routine) -> Result<bool, SchedulerError> {
        if routine.enabled && routine.is_timer() {
            self.arm(routine)
        } else {
            self.disarm(routine.id);
            Ok(false)
        }
    }

    /// Whether a tick of `generation` still belongs to the routine's live
    /// timer.
    #[must_use]
    pub fn is_current(&self, routine_id: RoutineId, generation: u64) -> bool {
        self.lock_timers()
            .get(&routine_id)
            .is_some_and(|timer| timer.generation == generation)
    }

    #[must_use]
    pub fn is_armed(&self, routine_id: RoutineId) -> bool {
        self.lock_timers().contains_key(&routine_id)
    }

    /// Whether a tick-started firing of the routine still holds its permit.
    #[must_use]
    pub fn is_running(&self, routine_id: RoutineId) -> bool {
        self.tokens.is_busy(routine_id)
    }

    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.lock_timers().len()
    }

    /// Cancel every timer.
    pub fn shutdown(&self) {
        let timers: Vec<_> = self.lock_timers().drain().collect();
        for (_, timer) in &timers {
            timer.handle.abort();
        }
        tracing::info!(count = timers.len(), "scheduler stopped");
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<RoutineId, ArmedTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TriggerScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.lock_timers().drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use soundboard_domain::routine::{Action, Trigger};
    use soundboard_domain::voice::VoiceEventKind;

    fn timer(secs: u64) -> Routine {
        Routine::builder()
            .guild_id(GuildId::new("1").unwrap())
            .name("Timer")
            .trigger(Trigger::timer(secs).unwrap())
            .action(Action::play("x"))
            .build()
            .unwrap()
    }

    async fn drain(rx: &mut mpsc::UnboundedReceiver<Tick>) -> Vec<Tick> {
        // let spawned timer tasks observe the advanced clock
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    #[tokio::test(start_paused = true)]
    async fn should_first_tick_one_interval_after_arming() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let routine = timer(10);
        assert!(scheduler.arm(&routine).unwrap());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(drain(&mut rx).await.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        let ticks = drain(&mut rx).await;
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].routine_id, routine.id);
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_tick_while_previous_firing_holds_permit() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let routine = timer(5);
        scheduler.arm(&routine).unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let held = drain(&mut rx).await;
        assert_eq!(held.len(), 1);
        assert!(scheduler.is_running(routine.id));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).await.is_empty());

        drop(held);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(drain(&mut rx).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_missed_ticks_instead_of_bursting() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        scheduler.arm(&timer(1)).unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        let first = drain(&mut rx).await;
        assert_eq!(first.len(), 1);
        // the firing stays busy across several periods
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).await.is_empty());
        drop(first);
        // nothing queued up while busy
        assert!(drain(&mut rx).await.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(drain(&mut rx).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_ticking_when_disarmed() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let routine = timer(5);
        scheduler.arm(&routine).unwrap();
        assert!(scheduler.disarm(routine.id));
        assert!(!scheduler.is_armed(routine.id));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(drain(&mut rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_full_interval_when_rearmed() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let routine = timer(10);
        scheduler.arm(&routine).unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        scheduler.sync(&routine).unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(drain(&mut rx).await.is_empty());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(drain(&mut rx).await.len(), 1);
        assert_eq!(scheduler.armed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_arm_disabled_or_event_routines() {
        let (scheduler, _rx) = TriggerScheduler::new();
        let mut disabled = timer(5);
        disabled.enabled = false;
        assert!(!scheduler.sync(&disabled).unwrap());

        let mut event = timer(5);
        event.trigger = Trigger::event(VoiceEventKind::Join);
        assert!(!scheduler.sync(&event).unwrap());
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_routines_with_same_interval_independently() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let a = timer(5);
        let b = timer(5);
        scheduler.arm(&a).unwrap();
        scheduler.arm(&b).unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let ticks = drain(&mut rx).await;
        let mut ids: Vec<_> = ticks.iter().map(|t| t.routine_id).collect();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_everything_on_shutdown() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        scheduler.arm(&timer(1)).unwrap();
        scheduler.arm(&timer(2)).unwrap();
        scheduler.shutdown();
        assert_eq!(scheduler.armed_count(), 0);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(drain(&mut rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_treat_queued_tick_as_stale_after_rearm() {
        let (scheduler, mut rx) = TriggerScheduler::new();
        let routine = timer(10);
        scheduler.arm(&routine).unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        let ticks = drain(&mut rx).await;
        assert_eq!(ticks.len(), 1);
        let queued = &ticks[0];
        assert!(scheduler.is_current(queued.routine_id, queued.generation));

        scheduler.disarm(routine.id);
        assert!(!scheduler.is_current(queued.routine_id, queued.generation));
        scheduler.arm(&routine).unwrap();
        assert!(!scheduler.is_current(queued.routine_id, queued.generation));
    }

    #[tokio::test]
    async fn should_refuse_interval_the_clock_cannot_hold() {
        let (scheduler, _rx) = TriggerScheduler::new();
        let mut routine = timer(1);
        routine.trigger = Trigger::Timer {
            interval_secs: u64::MAX,
        };

        assert_eq!(
            scheduler.arm(&routine),
            Err(SchedulerError::IntervalOverflow(routine.id.to_string()))
        );
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn should_fail_outside_runtime() {
        let (scheduler, _rx) = TriggerScheduler::new();
        assert!(matches!(
            scheduler.arm(&timer(1)),
            Err(SchedulerError::NoRuntime(_))
        ));
    }
}
