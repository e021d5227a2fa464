use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Severity {
    #[default]
    Neutral,
    Destructive,
}

/// Sink for transient, fire-and-forget notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, severity: Severity);
}

impl<F> Notifier for F
where
    F: Fn(&str, &str, Severity) + Send + Sync,
{
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        (self)(title, description, severity)
    }
}

/// Forwards notifications to `tracing` when no toast surface is mounted.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        match severity {
            Severity::Neutral => tracing::info!(title, description, "notification"),
            Severity::Destructive => tracing::warn!(title, description, "notification"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ToastId(pub u64);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToastEntry {
    pub id: Option<ToastId>,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub auto_close_ms: Option<u32>,
    pub closable: bool,
}

impl ToastEntry {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            severity: Severity::Neutral,
            auto_close_ms: Some(4_000),
            closable: true,
        }
    }

    pub fn severity(mut self, value: Severity) -> Self {
        self.severity = value;
        self
    }

    pub fn auto_close_ms(mut self, value: Option<u32>) -> Self {
        self.auto_close_ms = value;
        self
    }

    pub fn closable(mut self, value: bool) -> Self {
        self.closable = value;
        self
    }
}

struct ToastState {
    queue: VecDeque<ToastEntry>,
    max_visible: usize,
}

impl Default for ToastState {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            max_visible: 5,
        }
    }
}

/// Bounded queue of visible toasts. Clones share the same queue.
#[derive(Clone, Default)]
pub struct ToastManager {
    next_id: Arc<AtomicU64>,
    state: Arc<RwLock<ToastState>>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_visible(&self, value: usize) {
        let mut state = self.write();
        state.max_visible = value.max(1);
        let limit = state.max_visible;
        while state.queue.len() > limit {
            state.queue.pop_front();
        }
    }

    pub fn show(&self, mut entry: ToastEntry) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        entry.id = Some(id);

        let mut state = self.write();
        let limit = state.max_visible;
        state.queue.push_back(entry);
        while state.queue.len() > limit {
            state.queue.pop_front();
        }
        id
    }

    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut state = self.write();
        match state.queue.iter().position(|entry| entry.id == Some(id)) {
            Some(index) => state.queue.remove(index).is_some(),
            None => false,
        }
    }

    pub fn dismiss_all(&self) {
        self.write().queue.clear();
    }

    pub fn list(&self) -> Vec<ToastEntry> {
        self.read().queue.iter().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, ToastState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ToastState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Notifier for ToastManager {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        self.show(ToastEntry::new(title, description).severity(severity));
    }
}
