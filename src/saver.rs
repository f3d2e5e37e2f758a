//! Debounced answer saving
//!
//! Each call to `save_answer` shows "Saving...", cancels any save still
//! waiting out its quiet interval, and schedules a new one. When the quiet
//! interval passes without another call, the answer is POSTed once, the
//! indicator shows "Saved!" or "Error", and it is hidden after a fixed delay
//! whatever the outcome.
//!
//! Saves already sent are never cancelled. If the user edits again while an
//! earlier request is unsettled, both requests are in flight and their
//! responses may settle in either order; this is logged, not resolved.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use serde_json::Value;

use crate::config::SyncConfig;
use crate::payload::AnswerPayload;
use crate::platform::{Runtime, StatusView, Transport};
use crate::status::SaveStatus;

/// A scheduled save that has not fired yet
struct PendingSave {
    id: u64,
    abort: AbortHandle,
}

struct SaverInner<R, T, S> {
    runtime: R,
    transport: T,
    status: S,
    save_endpoint: String,
    quiet_interval_ms: u32,
    status_hide_delay_ms: u32,
    pending: RefCell<Option<PendingSave>>,
    next_id: Cell<u64>,
    in_flight: Cell<usize>,
}

/// Debounced save component; clones share the same pending timer
pub struct AnswerSaver<R, T, S> {
    inner: Rc<SaverInner<R, T, S>>,
}

impl<R, T, S> Clone for AnswerSaver<R, T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R, T, S> AnswerSaver<R, T, S>
where
    R: Runtime + 'static,
    T: Transport + 'static,
    S: StatusView + 'static,
{
    pub fn new(runtime: R, transport: T, status: S, config: &SyncConfig) -> Self {
        Self {
            inner: Rc::new(SaverInner {
                runtime,
                transport,
                status,
                save_endpoint: config.save_endpoint.clone(),
                quiet_interval_ms: config.quiet_interval_ms,
                status_hide_delay_ms: config.status_hide_delay_ms,
                pending: RefCell::new(None),
                next_id: Cell::new(0),
                in_flight: Cell::new(0),
            }),
        }
    }

    /// Schedule a save of `answer` for `question`, replacing any save that
    /// has not fired yet. Never fails; outcomes only reach the indicator.
    pub fn save_answer(&self, question: impl Into<String>, answer: Value) {
        let inner = &self.inner;
        let payload = AnswerPayload::new(question, answer);

        let superseded = inner.pending.borrow_mut().take();
        if let Some(prev) = superseded {
            prev.abort.abort();
            log::debug!("Save #{} superseded before firing", prev.id);
        }

        inner.status.set_text(SaveStatus::Saving.as_str());
        inner.status.set_visible(true);

        let id = inner.next_id.get();
        inner.next_id.set(id + 1);

        let (abort, registration) = AbortHandle::new_pair();
        *inner.pending.borrow_mut() = Some(PendingSave { id, abort });

        // Timer starts now, not when the task is first polled
        let quiet = inner.runtime.sleep(inner.quiet_interval_ms);
        let task_inner = Rc::clone(inner);
        let debounced = Abortable::new(
            async move {
                quiet.await;
                task_inner.fire(id, payload).await;
            },
            registration,
        );

        inner.runtime.spawn(Box::pin(async move {
            let _ = debounced.await;
        }));
    }

    /// Whether a save is waiting out its quiet interval
    pub fn has_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// Saves sent but not yet settled
    pub fn in_flight_saves(&self) -> usize {
        self.inner.in_flight.get()
    }
}

impl<R, T, S> SaverInner<R, T, S>
where
    R: Runtime,
    T: Transport,
    S: StatusView,
{
    async fn fire(&self, id: u64, payload: AnswerPayload) {
        // Past this point a newer call can no longer cancel us
        {
            let mut pending = self.pending.borrow_mut();
            if pending.as_ref().is_some_and(|p| p.id == id) {
                *pending = None;
            }
        }

        let settled = match self.send(&payload).await {
            Ok(()) => {
                log::info!("Saved answer #{} ({:?})", id, payload.question);
                SaveStatus::Saved
            }
            Err(e) => {
                log::warn!("Failed to save answer #{} ({:?}): {}", id, payload.question, e);
                SaveStatus::Error
            }
        };
        self.status.set_text(settled.as_str());

        self.runtime.sleep(self.status_hide_delay_ms).await;
        self.status.set_visible(false);
    }

    async fn send(&self, payload: &AnswerPayload) -> crate::Result<()> {
        let body = payload.to_json()?;

        let unsettled = self.in_flight.get();
        if unsettled > 0 {
            log::warn!(
                "Sending save while {} earlier save(s) are unsettled; responses may arrive out of order",
                unsettled
            );
        }

        self.in_flight.set(unsettled + 1);
        let result = self.transport.post_json(&self.save_endpoint, body).await;
        self.in_flight.set(self.in_flight.get() - 1);
        result
    }
}
