//! Cooperative delays behind a trait so waits and retries can be
//! fast-forwarded in tests.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use async_trait::async_trait;

#[async_trait(?Send)]
pub trait Scheduler {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real timers on the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait(?Send)]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

type SleepHook = Box<dyn FnMut(usize, Duration)>;

/// Virtual clock: every sleep returns at once and is recorded. An optional
/// hook runs on each sleep, letting tests change the page at exactly the
/// points where the engine yields.
#[derive(Default)]
pub struct ManualScheduler {
    elapsed: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
    hook: RefCell<Option<SleepHook>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("elapsed", &self.elapsed.get())
            .field("sleeps", &self.sleeps.borrow().len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook(sleep_index, duration)` on every sleep.
    pub fn with_hook<F>(hook: F) -> Self
    where
        F: FnMut(usize, Duration) + 'static,
    {
        Self {
            hook: RefCell::new(Some(Box::new(hook))),
            ..Self::default()
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.borrow().len()
    }
}

#[async_trait(?Send)]
impl Scheduler for ManualScheduler {
    async fn sleep(&self, duration: Duration) {
        let index = {
            let mut sleeps = self.sleeps.borrow_mut();
            sleeps.push(duration);
            sleeps.len() - 1
        };
        self.elapsed.set(self.elapsed.get() + duration);

        if let Some(hook) = self.hook.borrow_mut().as_mut() {
            hook(index, duration);
        }
    }
}
