use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use futures::task::{Spawn, SpawnError, SpawnExt};
use futures_timer::Delay;

use super::controller::{
    FormController, FormResult, FormState, ListenerRegistry, SubmissionPhase, ensure_live,
    publish_snapshot, transition_phase, write_lock,
};
use super::validation::ValidationError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResetOutcome {
    /// The delay elapsed and the form went back to its initial model.
    Completed,
    /// The task was aborted or the form was gone before it fired.
    Cancelled,
}

/// A delayed reset owned by its form.
///
/// The task only runs when polled; hand it to an executor with
/// [`ResetTask::spawn_on`] or await it directly.
#[must_use = "a reset task does nothing unless it is awaited or spawned"]
pub struct ResetTask {
    inner: BoxFuture<'static, ResetOutcome>,
}

impl ResetTask {
    /// Moves the task onto `spawner`.
    ///
    /// The returned watch only observes the outcome; dropping it leaves the
    /// spawned reset running.
    pub fn spawn_on<S>(self, spawner: &S) -> Result<ResetWatch, SpawnError>
    where
        S: Spawn + ?Sized,
    {
        let (sender, receiver) = oneshot::channel();
        spawner.spawn(async move {
            let _ = sender.send(self.await);
        })?;
        Ok(ResetWatch { receiver })
    }
}

impl Future for ResetTask {
    type Output = ResetOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl Debug for ResetTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTask").finish_non_exhaustive()
    }
}

/// Resolves with the outcome of a reset that already runs on an executor.
///
/// Resolves to [`ResetOutcome::Cancelled`] if the executor drops the task.
#[derive(Debug)]
pub struct ResetWatch {
    receiver: oneshot::Receiver<ResetOutcome>,
}

impl ResetWatch {
    pub(crate) fn resolved(outcome: ResetOutcome) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome);
        Self { receiver }
    }
}

impl Future for ResetWatch {
    type Output = ResetOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(ResetOutcome::Cancelled))
    }
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    /// Schedules a return to the initial model after `delay`.
    ///
    /// Scheduling again aborts the previous task. The task holds only weak
    /// references, so dropping every controller handle cancels it as well as
    /// [`FormController::dispose`] does.
    pub fn schedule_reset(&self, delay: Duration) -> FormResult<ResetTask> {
        let (handle, registration) = AbortHandle::new_pair();
        let form_id = {
            let mut state = write_lock(&self.state, "scheduling reset")?;
            ensure_live(&state)?;
            if let Some(previous) = state.pending_reset.replace(handle) {
                previous.abort();
            }
            state.id
        };
        tracing::debug!(
            form = form_id.0,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduled form reset"
        );

        let state = Arc::downgrade(&self.state);
        let listeners = Arc::downgrade(&self.listeners);
        let work = async move {
            Delay::new(delay).await;
            fire_reset(state, listeners)
        };
        let inner = Abortable::new(work, registration)
            .map(|result| result.unwrap_or(ResetOutcome::Cancelled))
            .boxed();
        Ok(ResetTask { inner })
    }
}

fn fire_reset<T: Clone, E: Clone>(
    state: Weak<RwLock<FormState<T, E>>>,
    listeners: Weak<RwLock<ListenerRegistry<T, E>>>,
) -> ResetOutcome {
    let (Some(state), Some(listeners)) = (state.upgrade(), listeners.upgrade()) else {
        return ResetOutcome::Cancelled;
    };

    {
        let mut guard = match write_lock(&state, "applying scheduled reset") {
            Ok(guard) => guard,
            Err(error) => {
                tracing::warn!(%error, "scheduled reset skipped");
                return ResetOutcome::Cancelled;
            }
        };
        if guard.disposed {
            return ResetOutcome::Cancelled;
        }
        guard.pending_reset = None;
        guard.model = guard.initial_model.clone();
        guard.errors.clear();
        if let Err(error) = transition_phase(&mut guard, SubmissionPhase::Idle) {
            tracing::warn!(%error, "scheduled reset skipped");
            return ResetOutcome::Cancelled;
        }
    }

    if let Err(error) = publish_snapshot(&state, &listeners) {
        tracing::warn!(%error, "failed to publish reset snapshot");
    }
    ResetOutcome::Completed
}
