//! Single-threaded UI task queue.
//!
//! All widget mutation happens on the thread that owns the [`UiExecutor`]. Other threads
//! hand work over through a [`RemoteHandle`]; it is picked up on the next call to
//! [`UiExecutor::run_pending`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce()>;
type RemoteTask = Box<dyn FnOnce() + Send>;

enum TimerKind {
    Once(Option<Task>),
    Periodic {
        interval: Duration,
        tick: Box<dyn FnMut(Instant) -> ControlFlow<()>>,
    },
}

struct Timer {
    due: Instant,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    kind: TimerKind,
}

struct Queue {
    tasks: VecDeque<Task>,
    timers: Vec<Timer>,
    next_seq: u64,
}

/// Cancels a scheduled timer. Dropping the handle does not cancel.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Clone)]
pub struct UiExecutor {
    queue: Rc<RefCell<Queue>>,
    remote_tx: mpsc::Sender<RemoteTask>,
    remote_rx: Rc<mpsc::Receiver<RemoteTask>>,
    owner: ThreadId,
}

/// `Send` handle for marshaling closures onto the UI thread.
#[derive(Clone)]
pub struct RemoteHandle {
    tx: mpsc::Sender<RemoteTask>,
}

impl RemoteHandle {
    /// Queue `f` for the UI thread. Returns false when the executor is gone.
    pub fn async_exec(&self, f: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(f)).is_ok()
    }
}

impl Default for UiExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl UiExecutor {
    pub fn new() -> Self {
        let (remote_tx, remote_rx) = mpsc::channel();
        Self {
            queue: Rc::new(RefCell::new(Queue {
                tasks: VecDeque::new(),
                timers: Vec::new(),
                next_seq: 0,
            })),
            remote_tx,
            remote_rx: Rc::new(remote_rx),
            owner: thread::current().id(),
        }
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn remote(&self) -> RemoteHandle {
        RemoteHandle {
            tx: self.remote_tx.clone(),
        }
    }

    /// Run `f` right away. The executor is `!Send`, so the caller is always on the UI thread.
    pub fn exec(&self, f: impl FnOnce()) {
        f();
    }

    /// Queue `f` behind everything already queued.
    pub fn async_exec(&self, f: impl FnOnce() + 'static) {
        self.queue.borrow_mut().tasks.push_back(Box::new(f));
    }

    pub fn timer_exec(&self, delay: Duration, f: impl FnOnce() + 'static) -> TimerHandle {
        self.add_timer(Instant::now() + delay, TimerKind::Once(Some(Box::new(f))))
    }

    /// Call `tick` every `interval` until it breaks or the handle is cancelled. `tick`
    /// receives the iteration's `now`, not the wall clock.
    pub fn timer_periodic(
        &self,
        interval: Duration,
        tick: impl FnMut(Instant) -> ControlFlow<()> + 'static,
    ) -> TimerHandle {
        self.add_timer(
            Instant::now() + interval,
            TimerKind::Periodic {
                interval,
                tick: Box::new(tick),
            },
        )
    }

    fn add_timer(&self, due: Instant, kind: TimerKind) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let mut q = self.queue.borrow_mut();
        let seq = q.next_seq;
        q.next_seq += 1;
        q.timers.push(Timer {
            due,
            seq,
            cancelled: cancelled.clone(),
            kind,
        });
        TimerHandle { cancelled }
    }

    pub fn run_pending(&self) -> usize {
        self.run_pending_at(Instant::now())
    }

    /// One event-loop iteration as of `now`: remote submissions, then the tasks queued
    /// before this call in FIFO order, then timers due at `now`. Work queued while running
    /// waits for the next iteration. Returns how many closures ran.
    pub fn run_pending_at(&self, now: Instant) -> usize {
        while let Ok(task) = self.remote_rx.try_recv() {
            self.queue.borrow_mut().tasks.push_back(task);
        }

        let batch: Vec<Task> = self.queue.borrow_mut().tasks.drain(..).collect();
        let mut ran = batch.len();
        for task in batch {
            task();
        }

        let mut due: Vec<Timer> = {
            let mut q = self.queue.borrow_mut();
            let timers = std::mem::take(&mut q.timers);
            let (due, waiting): (Vec<_>, Vec<_>) =
                timers.into_iter().partition(|t| t.due <= now);
            q.timers = waiting;
            due
        };
        due.sort_by_key(|t| (t.due, t.seq));

        for mut timer in due {
            if timer.cancelled.get() {
                continue;
            }
            ran += 1;
            match &mut timer.kind {
                TimerKind::Once(task) => {
                    if let Some(task) = task.take() {
                        task();
                    }
                }
                TimerKind::Periodic { interval, tick } => {
                    if tick(now).is_continue() && !timer.cancelled.get() {
                        timer.due = now + *interval;
                        self.queue.borrow_mut().timers.push(timer);
                    }
                }
            }
        }

        ran
    }

    pub fn has_pending(&self) -> bool {
        let q = self.queue.borrow();
        !q.tasks.is_empty() || q.timers.iter().any(|t| !t.cancelled.get())
    }
}
