//! Cancellable periodic recomputation of a will's unlock verdict.
//!
//! One task per displayed will. The task only publishes derived display
//! state through a `watch` channel; it never touches will state. It stops
//! when its token is cancelled, when every receiver is gone, or right after
//! publishing the first `Unlockable` verdict. Dropping the [`CountdownHandle`]
//! cancels the task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use legacychain_types::unlock::UnlockState;

use super::gate;
use crate::clock::Clock;

/// Default recomputation cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Owner of a running countdown task.
#[derive(Debug)]
pub struct CountdownHandle {
    receiver: watch::Receiver<UnlockState>,
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    /// A new receiver for verdict updates.
    pub fn subscribe(&self) -> watch::Receiver<UnlockState> {
        self.receiver.clone()
    }

    /// The most recently published verdict.
    pub fn current(&self) -> UnlockState {
        *self.receiver.borrow()
    }

    /// The task's own token (a child of the token passed to [`spawn_countdown`]).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the task to exit.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("countdown task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Spawn the countdown task for a will unlocking at `unlock_at`.
///
/// The initial verdict is computed synchronously, so `current()` is
/// meaningful immediately. Cancelling `parent` stops the task; dropping the
/// returned handle stops only this task.
pub fn spawn_countdown<C>(
    unlock_at: DateTime<Utc>,
    clock: C,
    interval: Duration,
    parent: &CancellationToken,
) -> CountdownHandle
where
    C: Clock + Clone,
{
    let initial = gate::evaluate(clock.now(), unlock_at);
    let (sender, receiver) = watch::channel(initial);
    let cancellation = parent.child_token();
    let token = cancellation.clone();

    let task = tokio::spawn(async move {
        if initial.is_unlockable() {
            return;
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the initial verdict already covers it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%unlock_at, "countdown cancelled");
                    break;
                }
                _ = sender.closed() => {
                    tracing::debug!(%unlock_at, "countdown has no observers");
                    break;
                }
                _ = ticker.tick() => {
                    let verdict = gate::evaluate(clock.now(), unlock_at);
                    sender.send_replace(verdict);
                    if verdict.is_unlockable() {
                        tracing::debug!(%unlock_at, "countdown reached unlock time");
                        break;
                    }
                }
            }
        }
    });

    CountdownHandle {
        receiver,
        cancellation,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test(start_paused = true)]
    async fn initial_verdict_is_available_immediately() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let handle = spawn_countdown(
            start + chrono::Duration::hours(25),
            clock,
            DEFAULT_INTERVAL,
            &CancellationToken::new(),
        );

        let remaining = handle.current().remaining().unwrap();
        assert_eq!((remaining.days, remaining.hours, remaining.minutes), (1, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_unlockable_and_stops() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let mut handle = spawn_countdown(
            start + chrono::Duration::minutes(2),
            clock.clone(),
            DEFAULT_INTERVAL,
            &CancellationToken::new(),
        );
        let mut rx = handle.subscribe();

        clock.advance(chrono::Duration::minutes(3));
        let verdict = *rx.wait_for(|v| v.is_unlockable()).await.unwrap();
        assert_eq!(verdict, UnlockState::Unlockable);

        handle.stopped().await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn recomputes_each_interval() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let handle = spawn_countdown(
            start + chrono::Duration::hours(2),
            clock.clone(),
            DEFAULT_INTERVAL,
            &CancellationToken::new(),
        );
        let mut rx = handle.subscribe();

        clock.advance(chrono::Duration::minutes(61));
        let verdict = *rx
            .wait_for(|v| v.remaining().is_some_and(|r| r.hours == 0))
            .await
            .unwrap();
        assert_eq!(verdict.remaining().unwrap().minutes, 59);
    }

    #[tokio::test(start_paused = true)]
    async fn already_unlocked_task_exits_immediately() {
        let start = Utc::now();
        let mut handle = spawn_countdown(
            start - chrono::Duration::seconds(1),
            ManualClock::new(start),
            DEFAULT_INTERVAL,
            &CancellationToken::new(),
        );
        assert!(handle.current().is_unlockable());
        handle.stopped().await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_task() {
        let start = Utc::now();
        let mut handle = spawn_countdown(
            start + chrono::Duration::days(10),
            ManualClock::new(start),
            DEFAULT_INTERVAL,
            &CancellationToken::new(),
        );
        handle.cancel();
        handle.stopped().await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_cascades() {
        let start = Utc::now();
        let parent = CancellationToken::new();
        let mut handle = spawn_countdown(
            start + chrono::Duration::days(10),
            ManualClock::new(start),
            DEFAULT_INTERVAL,
            &parent,
        );
        parent.cancel();
        handle.stopped().await;
        assert!(handle.cancellation_token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_only_this_task() {
        let start = Utc::now();
        let parent = CancellationToken::new();
        let handle = spawn_countdown(
            start + chrono::Duration::days(10),
            ManualClock::new(start),
            DEFAULT_INTERVAL,
            &parent,
        );
        let own = handle.cancellation_token();
        drop(handle);
        assert!(own.is_cancelled());
        assert!(!parent.is_cancelled());
    }
}
