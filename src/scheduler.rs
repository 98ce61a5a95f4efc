/// Timers and retry signals
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Time-based deferral on the page's event loop.
pub trait Scheduler {
    /// Run `task` once after `delay`. The returned handle can cancel it;
    /// dropping the handle leaves the task scheduled.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;

    /// Future that completes after `delay`.
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Cancellation handle for a scheduled task
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> TimerHandle {
        TimerHandle {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for a task that can't be cancelled.
    pub fn detached() -> TimerHandle {
        TimerHandle { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// What the caller should do once a retry signal fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryDecision {
    pub should_retry: bool,
    pub retry_count: u32,
}

/// Pending retry handed back to the reporter. The handler never re-runs
/// the failed operation itself; the caller awaits this and retries.
pub struct RetrySignal {
    delay: Duration,
    decision: RetryDecision,
    timer: LocalBoxFuture<'static, ()>,
}

impl RetrySignal {
    pub fn new(scheduler: &dyn Scheduler, delay: Duration, retry_count: u32) -> RetrySignal {
        RetrySignal {
            delay,
            decision: RetryDecision {
                should_retry: true,
                retry_count,
            },
            timer: scheduler.sleep(delay),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves after the delay.
    pub async fn wait(self) -> RetryDecision {
        self.timer.await;
        self.decision
    }
}

impl fmt::Debug for RetrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySignal")
            .field("delay", &self.delay)
            .field("decision", &self.decision)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Pending {
        delay: Duration,
        task: Option<Box<dyn FnOnce()>>,
    }

    /// Scheduler that records every request; tasks run on `run_all`.
    #[derive(Clone, Default)]
    pub struct ManualScheduler {
        pending: Rc<RefCell<Vec<Pending>>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
    }

    impl ManualScheduler {
        pub fn scheduled_delays(&self) -> Vec<Duration> {
            self.pending.borrow().iter().map(|p| p.delay).collect()
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }

        /// Runs every task that is still armed; returns how many ran.
        pub fn run_all(&self) -> usize {
            let tasks: Vec<Box<dyn FnOnce()>> = self
                .pending
                .borrow_mut()
                .iter_mut()
                .filter_map(|p| p.task.take())
                .collect();
            let count = tasks.len();
            for task in tasks {
                task();
            }
            count
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
            let mut pending = self.pending.borrow_mut();
            let index = pending.len();
            pending.push(Pending {
                delay,
                task: Some(task),
            });

            let shared = self.pending.clone();
            TimerHandle::new(move || {
                shared.borrow_mut()[index].task = None;
            })
        }

        fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
            self.sleeps.borrow_mut().push(delay);
            Box::pin(async {})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualScheduler;
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_cancelled_timer_never_runs() {
        let scheduler = ManualScheduler::default();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        let handle = scheduler.schedule(Duration::from_millis(500), Box::new(move || flag.set(true)));
        handle.cancel();

        assert_eq!(scheduler.run_all(), 0);
        assert!(!ran.get());
    }

    #[test]
    fn test_dropped_handle_keeps_task() {
        let scheduler = ManualScheduler::default();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        drop(scheduler.schedule(Duration::from_millis(500), Box::new(move || flag.set(true))));

        assert_eq!(scheduler.run_all(), 1);
        assert!(ran.get());
    }

    #[test]
    fn test_retry_signal_resolves_to_decision() {
        let scheduler = ManualScheduler::default();
        let signal = RetrySignal::new(&scheduler, Duration::from_millis(2000), 2);

        assert_eq!(signal.delay(), Duration::from_millis(2000));
        let decision = block_on(signal.wait());

        assert_eq!(
            decision,
            RetryDecision {
                should_retry: true,
                retry_count: 2
            }
        );
        assert_eq!(scheduler.sleeps(), vec![Duration::from_millis(2000)]);
    }

    #[test]
    fn test_detached_handle_cancel_is_noop() {
        TimerHandle::detached().cancel();
    }
}
