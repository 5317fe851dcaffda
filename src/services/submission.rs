// src/services/submission.rs
//! Single-shot submission of signed assertions.
//!
//! Each submission performs exactly one [`Transport::send`], bounded by a
//! caller-supplied deadline, and walks the state machine
//! `Built -> Submitted -> {Confirmed, Rejected, TimedOut, Failed}`.
//! The outcome reaches the caller exactly once, either as the output of
//! [`SignedRequestBuilder::submit_async`] or through the `FnOnce` callback of
//! [`SignedRequestBuilder::submit`]. Nothing is retried here.

use crate::error::RequestError;
use crate::ledger::transport::Transport;
use crate::models::action::ActionKind;
use crate::models::assertion::{ConfirmationAssertion, SignedAssertion};
use crate::services::request_builder::SignedRequestBuilder;
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// What a submission resolves to.
pub type RequestOutcome = Result<ConfirmationAssertion, RequestError>;

/// A callback bound to its outcome. Runs when invoked, or on drop if it
/// never was, so a discarded completion still reaches the caller.
struct Completion {
    job: Option<Box<dyn FnOnce() + Send>>,
}

impl Completion {
    fn new<F>(callback: F, outcome: RequestOutcome) -> Self
    where
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        Completion { job: Some(Box::new(move || callback(outcome))) }
    }

    fn run(mut self) {
        if let Some(job) = self.job.take() {
            job();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            warn!("completion discarded before running, running it now");
            job();
        }
    }
}

/// Where a submission's callback runs.
#[derive(Clone)]
pub enum CallbackContext {
    /// On the task that received the response.
    Inline,
    /// Spawned onto the given runtime. If that runtime has shut down the
    /// callback runs on the thread that discards the task.
    Runtime(Handle),
    /// Queued for the host to run on its own thread (e.g. the UI thread)
    /// by draining the matching [`CompletionPump`].
    Queue(CompletionQueue),
}

/// Sending half of a completion queue.
#[derive(Clone)]
pub struct CompletionQueue {
    tx: mpsc::UnboundedSender<Completion>,
}

/// Receiving half of a completion queue, owned by the thread that must run
/// the callbacks.
pub struct CompletionPump {
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl CompletionQueue {
    pub fn channel() -> (CompletionQueue, CompletionPump) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CompletionQueue { tx }, CompletionPump { rx })
    }

    fn dispatch(&self, job: Completion) {
        // A dropped pump must not swallow the outcome.
        if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
            warn!("completion pump is gone, running callback inline");
            job.run();
        }
    }
}

impl CompletionPump {
    /// Runs every queued callback without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job.run();
            ran += 1;
        }
        ran
    }

    /// Waits for the next callback and runs it.
    /// Returns `false` once every queue handle has been dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job.run();
                true
            }
            None => false,
        }
    }
}

impl Drop for CompletionPump {
    /// Runs whatever is still queued; later dispatches fall back to inline.
    fn drop(&mut self) {
        self.rx.close();
        let ran = self.run_pending();
        if ran > 0 {
            debug!("ran {ran} queued callbacks while dropping the pump");
        }
    }
}

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Built,
    Submitted,
    Confirmed,
    Rejected,
    TimedOut,
    /// The transport failed before the service answered.
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed
                | SubmissionState::Rejected
                | SubmissionState::TimedOut
                | SubmissionState::Failed
        )
    }

    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Built, Submitted) | (Submitted, Confirmed | Rejected | TimedOut | Failed)
        )
    }

    /// Terminal state reached by `outcome`.
    pub fn from_outcome(outcome: &RequestOutcome) -> SubmissionState {
        match outcome {
            Ok(_) => SubmissionState::Confirmed,
            Err(RequestError::Rejected { .. }) => SubmissionState::Rejected,
            Err(RequestError::Timeout(_)) => SubmissionState::TimedOut,
            Err(_) => SubmissionState::Failed,
        }
    }
}

struct Submission {
    action: ActionKind,
    state: SubmissionState,
}

impl Submission {
    fn new(action: ActionKind) -> Self {
        Submission { action, state: SubmissionState::Built }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("{} submission: {:?} -> {:?}", self.action, self.state, next);
        self.state = next;
    }
}

/// One exchange with the service. Consumes the assertion.
async fn exchange(
    assertion: SignedAssertion,
    transport: &dyn Transport,
    deadline: Duration,
) -> RequestOutcome {
    let action = assertion.action();
    let mut submission = Submission::new(action);
    submission.advance(SubmissionState::Submitted);

    let outcome = match timeout(deadline, transport.send(action, &assertion)).await {
        Ok(Ok(confirmation)) => Ok(confirmation),
        Ok(Err(err)) => Err(RequestError::from(err)),
        Err(_) => Err(RequestError::Timeout(deadline)),
    };
    submission.advance(SubmissionState::from_outcome(&outcome));

    match &outcome {
        Ok(_) => info!("{action} confirmed"),
        Err(err) => warn!("{action} failed: {err}"),
    }
    outcome
}

pub(crate) fn deliver<F>(context: &CallbackContext, callback: F, outcome: RequestOutcome)
where
    F: FnOnce(RequestOutcome) + Send + 'static,
{
    let completion = Completion::new(callback, outcome);
    match context {
        CallbackContext::Inline => completion.run(),
        CallbackContext::Runtime(handle) => {
            handle.spawn(async move { completion.run() });
        }
        CallbackContext::Queue(queue) => queue.dispatch(completion),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl SignedRequestBuilder {
    /// Submits `assertion` and resolves with the service's answer.
    ///
    /// Exactly one call to `transport`; the deadline covers the whole call.
    ///
    /// # Errors
    /// - `Network` when the transport fails
    /// - `Rejected` when the service declines the action
    /// - `Timeout` when no answer arrives within `deadline`
    pub async fn submit_async(
        &self,
        assertion: SignedAssertion,
        transport: &dyn Transport,
        deadline: Duration,
    ) -> RequestOutcome {
        exchange(assertion, transport, deadline).await
    }

    /// Submits `assertion` on a new task and hands the outcome to `callback`
    /// in the builder's [`CallbackContext`].
    ///
    /// `callback` runs exactly once, with either the confirmation or the
    /// error. A panicking transport is reported as `Network`.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn submit<F>(
        &self,
        assertion: SignedAssertion,
        transport: Arc<dyn Transport>,
        deadline: Duration,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        let context = self.callback_context.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(exchange(assertion, transport.as_ref(), deadline))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let reason = panic_message(payload.as_ref());
                    error!("transport panicked: {reason}");
                    Err(RequestError::Network(format!("transport panicked: {reason}")))
                });
            deliver(&context, callback, outcome);
        })
    }
}
