//! Waiting for something selected from a menu to become usable.
//!
//! A menu action may pick a target (e.g. a chat channel) that is still connecting. The
//! watch polls it once a second on the UI executor and fires the callback once it is
//! available, giving up after a few minutes.

use std::cell::{Cell, RefCell};
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::executor::TimerHandle;
use crate::session::UiSession;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const GIVE_UP_AFTER: Duration = Duration::from_secs(3 * 60);

pub trait Watchable {
    fn is_available(&self) -> bool;

    fn is_destroyed(&self) -> bool {
        false
    }

    /// Name used in log messages and as the session pending key.
    fn describe(&self) -> String;
}

/// One poll timer per watch; later `watch` calls while one is running are ignored.
pub struct AvailabilityWatch {
    session: UiSession,
    timer: RefCell<Option<TimerHandle>>,
    key: RefCell<Option<String>>,
    done: Rc<Cell<bool>>,
}

impl AvailabilityWatch {
    pub fn new(session: &UiSession) -> Self {
        Self {
            session: session.clone(),
            timer: RefCell::new(None),
            key: RefCell::new(None),
            done: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_watching(&self) -> bool {
        !self.done.get()
            && self
                .timer
                .borrow()
                .as_ref()
                .is_some_and(|t| !t.is_cancelled())
    }

    /// Poll `target` until available, then call `on_available` unless it was destroyed.
    /// Returns false when a watch is already running.
    pub fn watch<W>(&self, target: Rc<W>, on_available: impl FnOnce(&W) + 'static) -> bool
    where
        W: Watchable + ?Sized + 'static,
    {
        self.watch_from(Instant::now(), target, on_available)
    }

    fn watch_from<W>(&self, start: Instant, target: Rc<W>, on_available: impl FnOnce(&W) + 'static) -> bool
    where
        W: Watchable + ?Sized + 'static,
    {
        if self.timer.borrow().is_some() {
            return false;
        }

        let key = target.describe();
        self.session.mark_pending(&key);
        *self.key.borrow_mut() = Some(key.clone());

        let session = self.session.clone();
        let done = self.done.clone();
        let mut callback = Some(on_available);
        let handle = self.session.executor().timer_periodic(POLL_INTERVAL, move |now: Instant| {
            if target.is_available() {
                session.clear_pending(&key);
                if target.is_destroyed() {
                    log::debug!("{key} became available after being destroyed");
                } else if let Some(cb) = callback.take() {
                    cb(&*target);
                }
                done.set(true);
                return ControlFlow::Break(());
            }

            if now.saturating_duration_since(start) >= GIVE_UP_AFTER {
                log::warn!("gave up waiting for {key} to become available");
                session.clear_pending(&key);
                done.set(true);
                return ControlFlow::Break(());
            }

            ControlFlow::Continue(())
        });

        *self.timer.borrow_mut() = Some(handle);
        true
    }

    /// Stop polling. A watch that has not finished releases its pending flag.
    pub fn cancel(&self) {
        if let Some(t) = self.timer.borrow().as_ref() {
            t.cancel();
        }
        if !self.done.replace(true) {
            if let Some(key) = self.key.borrow_mut().take() {
                self.session.clear_pending(&key);
            }
        }
    }
}

impl Drop for AvailabilityWatch {
    fn drop(&mut self) {
        self.cancel();
    }
}
