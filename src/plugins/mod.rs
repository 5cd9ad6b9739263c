//! Plugin system
//!
//! Plugins subscribe observers to the compiler's three lifecycle hooks.
//! Observers run synchronously, in subscription order, exactly once per
//! run. A plugin only ever receives the hook dispatcher, never the
//! compiler's internal collections.

use tracing::trace;

/// Lifecycle points observers can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Before entry resolution
    Run,

    /// After chunks are generated, before assets are persisted
    Emit,

    /// After assets are persisted
    Done,
}

impl HookKind {
    fn index(self) -> usize {
        match self {
            HookKind::Run => 0,
            HookKind::Emit => 1,
            HookKind::Done => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            HookKind::Run => "run",
            HookKind::Emit => "emit",
            HookKind::Done => "done",
        }
    }
}

type Observer = Box<dyn Fn() + Send + Sync>;

/// Ordered observer lists for the three lifecycle hooks.
pub struct HookDispatcher {
    observers: [Vec<(String, Observer)>; 3],
}

impl Default for HookDispatcher {
    fn default() -> Self {
        Self {
            observers: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to `kind` under a diagnostic name.
    pub fn tap(
        &mut self,
        kind: HookKind,
        name: impl Into<String>,
        observer: impl Fn() + Send + Sync + 'static,
    ) {
        self.observers[kind.index()].push((name.into(), Box::new(observer)));
    }

    /// Invoke every observer for `kind`, in subscription order.
    pub fn call(&self, kind: HookKind) {
        for (name, observer) in &self.observers[kind.index()] {
            trace!("hook {}: calling '{}'", kind.name(), name);
            observer();
        }
    }

    /// Number of observers subscribed to `kind`.
    pub fn len(&self, kind: HookKind) -> usize {
        self.observers[kind.index()].len()
    }

    pub fn is_empty(&self, kind: HookKind) -> bool {
        self.observers[kind.index()].is_empty()
    }
}

/// External extension point: plugins subscribe to lifecycle hooks through
/// `apply`, called exactly once when the plugin is registered.
pub trait Plugin {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Subscribe hook observers.
    fn apply(&self, hooks: &mut HookDispatcher);
}
