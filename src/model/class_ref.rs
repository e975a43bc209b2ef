use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, TryLockError, Weak};
use std::thread::{self, ThreadId};

use tracing::debug;

use super::class::ClassMap;
use super::{ModelClass, ModelError, ModelRegistry};

type ClassFactory = Arc<dyn Fn() -> Option<Arc<ModelClass>> + Send + Sync>;

enum RefState {
    Resolved(Arc<ModelClass>),
    ByPath {
        registry: Weak<ClassMap>,
        path: String,
    },
    ByFactory(ClassFactory),
}

/// Deferred reference to a `ModelClass`.
///
/// Lets an attribute name a class that may not exist yet when the attribute is
/// declared (mutually-referencing classes). The first successful `resolve`
/// memoizes the class; later calls return it without consulting the path or
/// factory again. Clones share the memoized state.
#[derive(Clone)]
pub struct ModelClassRef {
    state: Arc<Mutex<RefState>>,
    /// Thread currently running the path lookup or factory, if any.
    resolver: Arc<Mutex<Option<ThreadId>>>,
}

/// Clears the resolver mark when resolution ends, including by panic.
struct ResolverMark<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for ResolverMark<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl ModelClassRef {
    /// An already-available class.
    pub fn direct(class: Arc<ModelClass>) -> Self {
        Self::from_state(RefState::Resolved(class))
    }

    /// A dotted path looked up in `registry` on first resolution.
    pub fn by_path(registry: &ModelRegistry, path: impl Into<String>) -> Self {
        Self::from_state(RefState::ByPath {
            registry: registry.downgrade(),
            path: path.into(),
        })
    }

    /// A zero-argument factory invoked once, on first resolution.
    ///
    /// The factory must not resolve this reference (or a clone of it); doing
    /// so fails with `ModelError::Config` instead of waiting on itself.
    pub fn by_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Option<Arc<ModelClass>> + Send + Sync + 'static,
    {
        Self::from_state(RefState::ByFactory(Arc::new(factory)))
    }

    fn from_state(state: RefState) -> Self {
        ModelClassRef {
            state: Arc::new(Mutex::new(state)),
            resolver: Arc::new(Mutex::new(None)),
        }
    }

    /// False while a resolution is in progress.
    pub fn is_resolved(&self) -> bool {
        self.state
            .try_lock()
            .map(|state| matches!(*state, RefState::Resolved(_)))
            .unwrap_or(false)
    }

    /// Resolve the class, memoizing the result.
    ///
    /// The lock is held across the lookup so concurrent first resolutions run
    /// the factory at most once. A factory that re-enters `resolve` on the same
    /// reference gets a `ModelError::Config`.
    pub fn resolve(&self) -> Result<Arc<ModelClass>, ModelError> {
        let current = thread::current().id();
        let resolving = *self
            .resolver
            .lock()
            .map_err(|_| ModelError::LockPoisoned("model class resolution"))?;
        if resolving == Some(current) {
            return Err(ModelError::Config(
                "model class factory resolved its own reference".into(),
            ));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| ModelError::LockPoisoned("model class resolution"))?;
        if let RefState::Resolved(class) = &*state {
            return Ok(Arc::clone(class));
        }

        *self
            .resolver
            .lock()
            .map_err(|_| ModelError::LockPoisoned("model class resolution"))? = Some(current);
        let _mark = ResolverMark(&self.resolver);

        let class = match &*state {
            RefState::Resolved(class) => Arc::clone(class),
            RefState::ByPath { registry, path } => {
                let classes = registry.upgrade().ok_or_else(|| {
                    ModelError::Config(format!(
                        "model registry for '{}' was dropped before resolution",
                        path
                    ))
                })?;
                let classes = classes
                    .read()
                    .map_err(|_| ModelError::LockPoisoned("class lookup"))?;
                let class = classes.get(path).cloned().ok_or_else(|| {
                    ModelError::Config(format!("model class path '{}' did not resolve", path))
                })?;
                debug!(path = %path, "resolved model class path");
                class
            }
            RefState::ByFactory(factory) => factory().ok_or_else(|| {
                ModelError::Config("model class factory returned no class".into())
            })?,
        };

        *state = RefState::Resolved(Arc::clone(&class));
        Ok(class)
    }
}

impl From<Arc<ModelClass>> for ModelClassRef {
    fn from(class: Arc<ModelClass>) -> Self {
        ModelClassRef::direct(class)
    }
}

impl From<&Arc<ModelClass>> for ModelClassRef {
    fn from(class: &Arc<ModelClass>) -> Self {
        ModelClassRef::direct(Arc::clone(class))
    }
}

impl fmt::Debug for ModelClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.try_lock() {
            Ok(state) => match &*state {
                RefState::Resolved(class) => format!("Resolved({})", class.name()),
                RefState::ByPath { path, .. } => format!("ByPath({})", path),
                RefState::ByFactory(_) => "ByFactory".to_string(),
            },
            Err(TryLockError::WouldBlock) => "Resolving".to_string(),
            Err(TryLockError::Poisoned(_)) => "Poisoned".to_string(),
        };
        f.debug_tuple("ModelClassRef").field(&state).finish()
    }
}
