//! In-memory hosts for tests
//!
//! `ManualRuntime` runs tasks on a `LocalPool` and only lets time pass when
//! a test calls `advance`, so timer-driven behavior is deterministic.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use serde_json::Value;

use super::{Downloader, Runtime, StatusView, Transport};
use crate::error::{Result, SyncError};
use crate::payload::ExportFile;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct TimerSlot {
    fired: bool,
    waker: Option<Waker>,
}

struct Timer {
    deadline: u64,
    slot: Rc<RefCell<TimerSlot>>,
}

impl Timer {
    /// Nobody is waiting on it any more (the sleep future was dropped)
    fn abandoned(&self) -> bool {
        Rc::strong_count(&self.slot) == 1
    }
}

#[derive(Default)]
struct Clock {
    now: u64,
    timers: Vec<Timer>,
}

struct Sleep {
    slot: Rc<RefCell<TimerSlot>>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut slot = self.slot.borrow_mut();
        if slot.fired {
            Poll::Ready(())
        } else {
            slot.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

/// Virtual-clock runtime
#[derive(Clone)]
pub struct ManualRuntime {
    clock: Rc<RefCell<Clock>>,
    pool: Rc<RefCell<LocalPool>>,
    spawner: LocalSpawner,
}

impl ManualRuntime {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            clock: Rc::new(RefCell::new(Clock::default())),
            pool: Rc::new(RefCell::new(pool)),
            spawner,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.borrow().now
    }

    /// Timers someone is still waiting on
    pub fn pending_timers(&self) -> usize {
        self.clock
            .borrow()
            .timers
            .iter()
            .filter(|t| !t.abandoned())
            .count()
    }

    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward, firing timers in deadline order and letting
    /// woken tasks run between deadlines
    pub fn advance(&self, ms: u64) {
        let target = self.now() + ms;
        loop {
            self.run_until_stalled();

            let wakers = {
                let mut clock = self.clock.borrow_mut();
                clock.timers.retain(|t| !t.abandoned());
                let next = clock.timers.iter().map(|t| t.deadline).min();
                match next {
                    Some(deadline) if deadline <= target => {
                        clock.now = deadline;
                        let (due, rest): (Vec<_>, Vec<_>) =
                            clock.timers.drain(..).partition(|t| t.deadline <= deadline);
                        clock.timers = rest;
                        due.into_iter()
                            .filter_map(|t| {
                                let mut slot = t.slot.borrow_mut();
                                slot.fired = true;
                                slot.waker.take()
                            })
                            .collect::<Vec<_>>()
                    }
                    _ => break,
                }
            };

            for waker in wakers {
                waker.wake();
            }
        }

        self.clock.borrow_mut().now = target;
        self.run_until_stalled();
    }
}

impl Runtime for ManualRuntime {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(task)
            .expect("local pool accepts tasks");
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let slot = Rc::new(RefCell::new(TimerSlot::default()));
        let mut clock = self.clock.borrow_mut();
        let deadline = clock.now + u64::from(ms);
        clock.timers.push(Timer {
            deadline,
            slot: Rc::clone(&slot),
        });
        Box::pin(Sleep { slot })
    }
}

/// How the fake server answers save requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Accept,
    NetworkDown,
    Reject(u16),
}

/// How the fake server answers GET requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    Body(String),
    NetworkDown,
    Reject(u16),
}

struct TransportState {
    posts: RefCell<Vec<(String, Value)>>,
    gets: RefCell<Vec<String>>,
    post_outcome: Cell<PostOutcome>,
    get_outcome: RefCell<GetOutcome>,
    latency: RefCell<Option<(ManualRuntime, u32)>>,
}

/// Records every request and answers from canned responses
#[derive(Clone)]
pub struct RecordingTransport {
    state: Rc<TransportState>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            state: Rc::new(TransportState {
                posts: RefCell::new(Vec::new()),
                gets: RefCell::new(Vec::new()),
                post_outcome: Cell::new(PostOutcome::Accept),
                get_outcome: RefCell::new(GetOutcome::NetworkDown),
                latency: RefCell::new(None),
            }),
        }
    }

    /// Delay every response by `ms` on the given runtime's clock
    pub fn with_latency(self, runtime: &ManualRuntime, ms: u32) -> Self {
        *self.state.latency.borrow_mut() = Some((runtime.clone(), ms));
        self
    }

    pub fn set_post_outcome(&self, outcome: PostOutcome) {
        self.state.post_outcome.set(outcome);
    }

    /// Document served by `get_text`; `None` makes the fetch fail
    pub fn serve_document(&self, document: Option<Value>) {
        let outcome = match document {
            Some(doc) => GetOutcome::Body(doc.to_string()),
            None => GetOutcome::NetworkDown,
        };
        self.set_get_outcome(outcome);
    }

    pub fn set_get_outcome(&self, outcome: GetOutcome) {
        *self.state.get_outcome.borrow_mut() = outcome;
    }

    /// (url, parsed body) of every POST issued so far
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.state.posts.borrow().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.state.gets.borrow().clone()
    }

    fn delay(&self) -> Option<LocalBoxFuture<'static, ()>> {
        self.state
            .latency
            .borrow()
            .as_ref()
            .map(|(runtime, ms)| runtime.sleep(*ms))
    }
}

impl Transport for RecordingTransport {
    fn post_json(&self, url: &str, body: String) -> LocalBoxFuture<'static, Result<()>> {
        let body: Value = serde_json::from_str(&body).expect("save body is JSON");
        self.state.posts.borrow_mut().push((url.to_string(), body));

        let result = match self.state.post_outcome.get() {
            PostOutcome::Accept => Ok(()),
            PostOutcome::NetworkDown => Err(SyncError::Network("connection refused".into())),
            PostOutcome::Reject(code) => Err(SyncError::Status(code)),
        };
        let delay = self.delay();
        Box::pin(async move {
            if let Some(delay) = delay {
                delay.await;
            }
            result
        })
    }

    fn get_text(&self, url: &str) -> LocalBoxFuture<'static, Result<String>> {
        self.state.gets.borrow_mut().push(url.to_string());

        let result = match &*self.state.get_outcome.borrow() {
            GetOutcome::Body(body) => Ok(body.clone()),
            GetOutcome::NetworkDown => Err(SyncError::Network("connection refused".into())),
            GetOutcome::Reject(code) => Err(SyncError::Status(*code)),
        };
        let delay = self.delay();
        Box::pin(async move {
            if let Some(delay) = delay {
                delay.await;
            }
            result
        })
    }
}

#[derive(Default)]
struct StatusState {
    text: String,
    visible: bool,
    history: Vec<String>,
}

/// Status indicator that remembers every text it showed
#[derive(Clone, Default)]
pub struct RecordingStatus {
    state: Rc<RefCell<StatusState>>,
}

impl RecordingStatus {
    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }
}

impl StatusView for RecordingStatus {
    fn set_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.text = text.to_string();
        state.history.push(text.to_string());
    }

    fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }
}

/// Collects offered downloads
#[derive(Clone, Default)]
pub struct RecordingDownloader {
    files: Rc<RefCell<Vec<ExportFile>>>,
}

impl RecordingDownloader {
    pub fn files(&self) -> Vec<ExportFile> {
        self.files.borrow().clone()
    }
}

impl Downloader for RecordingDownloader {
    fn offer(&self, file: &ExportFile) -> Result<()> {
        self.files.borrow_mut().push(file.clone());
        Ok(())
    }
}
