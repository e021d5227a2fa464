use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::AbortHandle;

use super::validation::ValidationError;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(pub u64);

/// Where a form is in its submit cycle.
///
/// There is no failed phase: a rejected or failed attempt returns to `Idle`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
}

impl SubmissionPhase {
    /// Whether a submit call would be turned away in this phase.
    pub fn is_busy(self) -> bool {
        matches!(self, SubmissionPhase::Submitting | SubmissionPhase::Succeeded)
    }
}

/// Per-field errors in field registration order, at most one per field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldErrors<E> {
    entries: Vec<(FieldKey, E)>,
}

impl<E> Default for FieldErrors<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> FieldErrors<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: FieldKey) -> Option<&E> {
        self.entries
            .iter()
            .find_map(|(candidate, error)| (*candidate == key).then_some(error))
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<(FieldKey, &E)> {
        self.entries.first().map(|(key, error)| (*key, error))
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &E)> + '_ {
        self.entries.iter().map(|(key, error)| (*key, error))
    }

    pub(super) fn insert(&mut self, key: FieldKey, error: E) {
        match self.entries.iter_mut().find(|(candidate, _)| *candidate == key) {
            Some(entry) => entry.1 = error,
            None => self.entries.push((key, error)),
        }
    }

    pub(super) fn remove(&mut self, key: FieldKey) -> Option<E> {
        let index = self
            .entries
            .iter()
            .position(|(candidate, _)| *candidate == key)?;
        Some(self.entries.remove(index).1)
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E: ValidationError> FieldErrors<E> {
    pub fn message(&self, key: FieldKey) -> Option<String> {
        self.get(key).map(ValidationError::message)
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T, E> {
    pub model: T,
    pub phase: SubmissionPhase,
    pub submit_count: u32,
    pub is_valid: bool,
    pub errors: FieldErrors<E>,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submission phase transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        from: SubmissionPhase,
        to: SubmissionPhase,
    },
    #[error("form has been disposed")]
    Disposed,
    #[error("form does not accept edits while {0:?}")]
    Busy(SubmissionPhase),
}

pub type FormResult<T> = Result<T, FormError>;

/// Result of one submit call.
#[derive(Debug, Eq, PartialEq)]
pub enum Submission<R, X> {
    /// Another attempt is outstanding; nothing happened.
    Busy,
    /// Validation failed and the field errors were replaced.
    Rejected,
    /// The dispatcher ran and succeeded.
    Dispatched(R),
    /// The dispatcher ran and failed; fields and errors are left untouched.
    Failed(X),
}

pub(super) type SyncFieldValidatorFn<T, E> = Arc<dyn Fn(&T) -> Result<(), E> + Send + Sync>;
pub(super) type Listener<T, E> = Arc<dyn Fn(&FormSnapshot<T, E>) + Send + Sync>;

pub(super) struct FormState<T, E> {
    pub(super) id: FormId,
    pub(super) initial_model: T,
    pub(super) model: T,
    pub(super) phase: SubmissionPhase,
    pub(super) submit_count: u32,
    pub(super) errors: FieldErrors<E>,
    pub(super) pending_reset: Option<AbortHandle>,
    pub(super) disposed: bool,
}

impl<T: Clone, E: Clone> FormState<T, E> {
    pub(super) fn snapshot(&self) -> FormSnapshot<T, E> {
        FormSnapshot {
            model: self.model.clone(),
            phase: self.phase,
            submit_count: self.submit_count,
            is_valid: self.errors.is_empty(),
            errors: self.errors.clone(),
        }
    }
}

pub(super) struct ListenerRegistry<T, E> {
    next_id: u64,
    pub(super) entries: BTreeMap<SubscriptionId, Listener<T, E>>,
}

impl<T, E> Default for ListenerRegistry<T, E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Clone)]
pub struct FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    pub(super) state: Arc<RwLock<FormState<T, E>>>,
    pub(super) field_validators: Arc<RwLock<Vec<(FieldKey, Vec<SyncFieldValidatorFn<T, E>>)>>>,
    pub(super) listeners: Arc<RwLock<ListenerRegistry<T, E>>>,
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_model: initial.clone(),
                model: initial,
                phase: SubmissionPhase::Idle,
                submit_count: 0,
                errors: FieldErrors::new(),
                pending_reset: None,
                disposed: false,
            })),
            field_validators: Arc::new(RwLock::new(Vec::new())),
            listeners: Arc::new(RwLock::new(ListenerRegistry::default())),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    /// Validates the model and, when it passes, hands a copy to `dispatch`.
    ///
    /// No lock is held while `dispatch` runs, so it may call back into the
    /// controller; a nested submit sees `Submitting` and returns `Busy`.
    pub fn submit<R, X>(
        &self,
        dispatch: impl FnOnce(&T) -> Result<R, X>,
    ) -> FormResult<Submission<R, X>> {
        let form_id = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            ensure_live(&state)?;
            if state.phase.is_busy() {
                tracing::debug!(form = state.id.0, phase = ?state.phase, "submit ignored");
                return Ok(Submission::Busy);
            }
            transition_phase(&mut state, SubmissionPhase::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            state.id
        };
        self.publish()?;

        if !self.recompute_errors()? {
            {
                let mut state = write_lock(&self.state, "handling submit validation failure")?;
                transition_phase(&mut state, SubmissionPhase::Idle)?;
                tracing::debug!(
                    form = form_id.0,
                    errors = state.errors.len(),
                    "submit rejected by validation"
                );
            }
            self.publish()?;
            return Ok(Submission::Rejected);
        }

        let model = {
            let mut state = write_lock(&self.state, "moving submit to submitting")?;
            transition_phase(&mut state, SubmissionPhase::Submitting)?;
            state.model.clone()
        };
        self.publish()?;

        let result = dispatch(&model);

        {
            let mut state = write_lock(&self.state, "completing submit")?;
            ensure_live(&state)?;
            let next = if result.is_ok() {
                SubmissionPhase::Succeeded
            } else {
                SubmissionPhase::Idle
            };
            transition_phase(&mut state, next)?;
        }
        self.publish()?;

        Ok(match result {
            Ok(value) => Submission::Dispatched(value),
            Err(error) => Submission::Failed(error),
        })
    }

    /// Restores the initial model, clears errors and drops any scheduled reset.
    pub fn reset_to_initial(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            ensure_live(&state)?;
            if let Some(pending) = state.pending_reset.take() {
                pending.abort();
            }
            state.model = state.initial_model.clone();
            state.errors.clear();
            transition_phase(&mut state, SubmissionPhase::Idle)?;
        }
        self.publish()
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "clearing all field errors")?;
            ensure_live(&state)?;
            state.errors.clear();
        }
        self.publish()
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T, E>> {
        Ok(read_lock(&self.state, "creating form snapshot")?.snapshot())
    }

    pub fn phase(&self) -> FormResult<SubmissionPhase> {
        Ok(read_lock(&self.state, "reading submission phase")?.phase)
    }

    pub fn errors(&self) -> FormResult<FieldErrors<E>> {
        Ok(read_lock(&self.state, "reading field errors")?
            .errors
            .clone())
    }

    /// Registers a listener that receives a snapshot after every change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&FormSnapshot<T, E>) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        ensure_live(&*read_lock(&self.state, "checking liveness for subscribe")?)?;
        let mut registry = write_lock(&self.listeners, "registering listener")?;
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.entries.insert(id, Arc::new(listener));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        Ok(write_lock(&self.listeners, "removing listener")?
            .entries
            .remove(&id)
            .is_some())
    }

    /// Tears the form down: cancels the scheduled reset and drops listeners.
    ///
    /// Every later mutating call returns `FormError::Disposed`.
    pub fn dispose(&self) -> FormResult<()> {
        let pending = {
            let mut state = write_lock(&self.state, "disposing form")?;
            state.disposed = true;
            state.pending_reset.take()
        };
        if let Some(pending) = pending {
            pending.abort();
        }
        write_lock(&self.listeners, "dropping listeners")?
            .entries
            .clear();
        Ok(())
    }

    pub fn is_disposed(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading disposed flag")?.disposed)
    }

    pub(super) fn publish(&self) -> FormResult<()> {
        publish_snapshot(&self.state, &self.listeners)
    }
}

pub(super) fn publish_snapshot<T: Clone, E: Clone>(
    state: &RwLock<FormState<T, E>>,
    listeners: &RwLock<ListenerRegistry<T, E>>,
) -> FormResult<()> {
    let listeners = read_lock(listeners, "reading listeners")?
        .entries
        .values()
        .cloned()
        .collect::<Vec<_>>();
    if listeners.is_empty() {
        return Ok(());
    }
    let snapshot = read_lock(state, "creating published snapshot")?.snapshot();
    for listener in listeners {
        listener(&snapshot);
    }
    Ok(())
}

pub(super) fn ensure_live<T, E>(state: &FormState<T, E>) -> FormResult<()> {
    if state.disposed {
        Err(FormError::Disposed)
    } else {
        Ok(())
    }
}

pub(super) fn transition_phase<T, E>(
    state: &mut FormState<T, E>,
    next: SubmissionPhase,
) -> FormResult<()> {
    let current = state.phase;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmissionPhase::Idle, SubmissionPhase::Validating)
            | (SubmissionPhase::Validating, SubmissionPhase::Submitting)
            | (SubmissionPhase::Submitting, SubmissionPhase::Succeeded)
            | (_, SubmissionPhase::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    tracing::debug!(form = state.id.0, from = ?current, to = ?next, "submission phase");
    state.phase = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
