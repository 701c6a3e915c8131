//! Timer service contracts used for load deadlines and placeholder delays.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc, time::Duration};

use futures::channel::oneshot;
use futures_timer::Delay;

/// Object-safe boxed future used by [`TimerService`].
pub type TimerFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Host timer capability.
pub trait TimerService {
    /// Returns a future that completes after `duration_ms` milliseconds.
    fn sleep(&self, duration_ms: u64) -> TimerFuture;
}

#[derive(Debug, Clone, Copy, Default)]
/// Wall-clock timer for embedded hosts. Works under any executor.
pub struct DelayTimerService;

impl TimerService for DelayTimerService {
    fn sleep(&self, duration_ms: u64) -> TimerFuture {
        Box::pin(Delay::new(Duration::from_millis(duration_ms)))
    }
}

#[derive(Debug, Default)]
struct ManualTimerState {
    now_ms: u64,
    pending: Vec<(u64, oneshot::Sender<()>)>,
}

#[derive(Debug, Clone, Default)]
/// Deterministic timer whose clock only moves when [`ManualTimerService::advance`] is called.
pub struct ManualTimerService {
    inner: Rc<RefCell<ManualTimerState>>,
}

impl ManualTimerService {
    /// Returns the current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Returns the number of sleeps that have not fired yet.
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Moves the virtual clock forward and fires every sleep whose deadline has passed.
    pub fn advance(&self, delta_ms: u64) {
        let due = {
            let mut state = self.inner.borrow_mut();
            state.now_ms = state.now_ms.saturating_add(delta_ms);
            let now = state.now_ms;
            let (due, waiting): (Vec<_>, Vec<_>) = state
                .pending
                .drain(..)
                .partition(|(deadline, _)| *deadline <= now);
            state.pending = waiting;
            due
        };
        for (_, sender) in due {
            let _ = sender.send(());
        }
    }
}

impl TimerService for ManualTimerService {
    fn sleep(&self, duration_ms: u64) -> TimerFuture {
        let (sender, receiver) = oneshot::channel();
        {
            let mut state = self.inner.borrow_mut();
            let deadline = state.now_ms.saturating_add(duration_ms);
            state.pending.push((deadline, sender));
        }
        Box::pin(async move {
            let _ = receiver.await;
        })
    }
}
