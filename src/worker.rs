//! Single-slot rebindable background task host.
//!
//! One long-lived task runs on a dedicated thread (the render core) while
//! the caller's thread stays free for input polling. The bound function can
//! be swapped at runtime: `bind` stops the loop, drains the in-flight
//! invocation, swaps under the task lock and re-requests a start, so the
//! loop never observes a partially-updated task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Poll interval for the idle loop and the drain spin-wait.
const POLL: Duration = Duration::from_millis(5);

type Task = Box<dyn FnMut() + Send>;

struct Inner {
    started: AtomicBool,
    run: AtomicBool,
    in_flight: AtomicBool,
    /// Held for the whole of every invocation, so acquiring it is also a
    /// wait for the in-flight call to return.
    task: Mutex<Option<Task>>,
    name: Mutex<String>,
}

/// A panicking task poisons its lock; the data behind it is still sound.
fn relock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Inner {
    /// Run one bound invocation if a task is bound.
    fn invoke_once(&self) {
        let mut slot = relock(&self.task);
        if let Some(task) = slot.as_mut() {
            self.in_flight.store(true, Ordering::SeqCst);
            task();
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }
}

/// Snapshot of the worker state.
#[derive(Clone, Debug)]
pub struct WorkerStatus {
    /// The background thread is up.
    pub core_started: bool,
    /// Name given to the currently bound task.
    pub worker: String,
    /// The loop has been asked to run the task.
    pub run_requested: bool,
    /// An invocation is executing right now.
    pub in_flight: bool,
}

pub struct Worker {
    inner: Arc<Inner>,
}

impl Worker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                started: AtomicBool::new(false),
                run: AtomicBool::new(false),
                in_flight: AtomicBool::new(false),
                task: Mutex::new(None),
                name: Mutex::new(String::new()),
            }),
        }
    }

    /// Launch the background thread. Idempotent — a second call is a no-op
    /// reporting success. Returns false (with an error log) when the OS
    /// refuses the thread; the caller then drives `run_inline` instead.
    pub fn start(&self) -> bool {
        if self.inner.started.load(Ordering::SeqCst) {
            log::debug!("render core already started");
            return true;
        }
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("render-core".into())
            .spawn(move || loop {
                if inner.run.load(Ordering::SeqCst) {
                    inner.invoke_once();
                } else {
                    thread::sleep(POLL);
                }
            });
        match spawned {
            Ok(_) => {
                self.inner.started.store(true, Ordering::SeqCst);
                log::info!("render core started");
                true
            }
            Err(e) => {
                log::error!("could not start render core: {e}");
                false
            }
        }
    }

    /// Replace the bound task. If the worker is running this first stops
    /// it and waits for the in-flight invocation to return (the spin-wait
    /// plus the task lock itself); the swap is atomic under the lock, and
    /// the worker is asked to start again afterwards.
    pub fn bind<F>(&self, name: &str, task: F)
    where
        F: FnMut() + Send + 'static,
    {
        let was_running = self.inner.run.load(Ordering::SeqCst);
        if was_running {
            self.request_stop();
        }
        while self.inner.in_flight.load(Ordering::SeqCst) {
            thread::sleep(POLL);
        }

        {
            let mut slot = relock(&self.inner.task);
            *slot = Some(Box::new(task));
            *relock(&self.inner.name) = name.to_string();
        }

        if was_running {
            self.request_start();
        }
    }

    /// Ask the loop to run the bound task; ignored while nothing is bound.
    pub fn request_start(&self) {
        let bound = relock(&self.inner.task).is_some();
        self.inner.run.store(bound, Ordering::SeqCst);
    }

    /// Ask the loop to stop. The in-flight invocation (if any) still runs
    /// to completion; only the next iteration is prevented.
    pub fn request_stop(&self) {
        self.inner.run.store(false, Ordering::SeqCst);
    }

    /// Block until no invocation is executing.
    pub fn drain(&self) {
        while self.inner.in_flight.load(Ordering::SeqCst) {
            thread::sleep(POLL);
        }
    }

    /// Single-core fallback: run one bound invocation on the calling
    /// thread, honoring the same run flag the background loop checks.
    pub fn run_inline(&self) {
        if self.inner.run.load(Ordering::SeqCst) {
            self.inner.invoke_once();
        }
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            core_started: self.inner.started.load(Ordering::SeqCst),
            worker: relock(&self.inner.name).clone(),
            run_requested: self.inner.run.load(Ordering::SeqCst),
            in_flight: self.inner.in_flight.load(Ordering::SeqCst),
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}
