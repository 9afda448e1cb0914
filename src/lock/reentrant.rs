use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use super::{Interrupt, Lock};
use crate::LockError;

/// How often an interruptible waiter re-checks its `Interrupt`.
const INTERRUPT_POLL: Duration = Duration::from_millis(10);

struct State {
    owner: Option<ThreadId>,
    holds: usize,
    next_ticket: u64,
    waiters: VecDeque<u64>,
}

/// Fair, process-local reentrant mutex backed by `Mutex<State>` + `Condvar`.
///
/// Blocked threads are served in arrival order (each takes a ticket), so a
/// thread that keeps re-acquiring the lock can't starve the others. The
/// non-blocking `try_lock` only succeeds when nobody is queued.
pub struct ReentrantMutex {
    state: Mutex<State>,
    wake: Condvar,
}

fn poisoned<T>(err: PoisonError<T>) -> LockError {
    LockError::Poisoned(err.to_string())
}

impl ReentrantMutex {
    pub fn new() -> Self {
        ReentrantMutex {
            state: Mutex::new(State {
                owner: None,
                holds: 0,
                next_ticket: 0,
                waiters: VecDeque::new(),
            }),
            wake: Condvar::new(),
        }
    }

    /// Number of threads currently waiting for the lock.
    pub fn queued_threads(&self) -> usize {
        self.state.lock().map(|s| s.waiters.len()).unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, LockError> {
        self.state.lock().map_err(poisoned)
    }

    fn acquire(
        &self,
        deadline: Option<Instant>,
        interrupt: Option<&Interrupt>,
    ) -> Result<bool, LockError> {
        let me = thread::current().id();
        let mut state = self.state()?;

        if interrupt.is_some_and(Interrupt::is_interrupted) {
            return Err(LockError::Interrupted);
        }
        if state.owner == Some(me) {
            state.holds += 1;
            return Ok(true);
        }
        if state.owner.is_none() && state.waiters.is_empty() {
            state.owner = Some(me);
            state.holds = 1;
            return Ok(true);
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiters.push_back(ticket);

        loop {
            if state.owner.is_none() && state.waiters.front() == Some(&ticket) {
                state.waiters.pop_front();
                state.owner = Some(me);
                state.holds = 1;
                return Ok(true);
            }

            if interrupt.is_some_and(Interrupt::is_interrupted) {
                self.abandon(&mut state, ticket);
                return Err(LockError::Interrupted);
            }

            let mut wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.abandon(&mut state, ticket);
                        return Ok(false);
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            if interrupt.is_some() {
                wait = Some(wait.map_or(INTERRUPT_POLL, |w| w.min(INTERRUPT_POLL)));
            }

            state = match wait {
                Some(wait) => self.wake.wait_timeout(state, wait).map_err(poisoned)?.0,
                None => self.wake.wait(state).map_err(poisoned)?,
            };
        }
    }

    /// Leave the queue. The next ticket may now be at the front, so wake
    /// everyone to let it notice.
    fn abandon(&self, state: &mut State, ticket: u64) {
        state.waiters.retain(|t| *t != ticket);
        self.wake.notify_all();
    }
}

impl Default for ReentrantMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for ReentrantMutex {
    fn lock(&self) -> Result<(), LockError> {
        self.acquire(None, None).map(|_| ())
    }

    fn lock_interruptibly(&self, interrupt: &Interrupt) -> Result<(), LockError> {
        self.acquire(None, Some(interrupt)).map(|_| ())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        let me = thread::current().id();
        let mut state = self.state()?;
        if state.owner == Some(me) {
            state.holds += 1;
            Ok(true)
        } else if state.owner.is_none() && state.waiters.is_empty() {
            state.owner = Some(me);
            state.holds = 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        let deadline = Instant::now().checked_add(timeout);
        self.acquire(deadline, None)
    }

    fn unlock(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state()?;
        if state.owner != Some(me) {
            return Err(LockError::NotOwner);
        }
        state.holds -= 1;
        if state.holds == 0 {
            state.owner = None;
            self.wake.notify_all();
        }
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.state.lock().map(|s| s.owner.is_some()).unwrap_or(false)
    }

    fn is_held_by_current_thread(&self) -> bool {
        let me = thread::current().id();
        self.state
            .lock()
            .map(|s| s.owner == Some(me))
            .unwrap_or(false)
    }

    fn hold_count(&self) -> usize {
        let me = thread::current().id();
        self.state
            .lock()
            .map(|s| if s.owner == Some(me) { s.holds } else { 0 })
            .unwrap_or(0)
    }
}
