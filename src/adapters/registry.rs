use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::clarabel::{ClarabelBackend, ClarabelSocpBackend};
use super::good_lp::{GoodLpClarabelBackend, MicrolpBackend};
use super::minilp::MinilpBackend;
use super::Backend;

static DEFAULT: Lazy<Arc<BackendRegistry>> = Lazy::new(|| Arc::new(BackendRegistry::with_defaults()));

/// Backends addressable by name.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<&'static str, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every engine compiled into this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MinilpBackend));
        registry.register(Arc::new(MicrolpBackend));
        registry.register(Arc::new(GoodLpClarabelBackend));
        registry.register(Arc::new(ClarabelSocpBackend));
        registry.register(Arc::new(ClarabelBackend));
        registry
    }

    /// Shared instance of [`BackendRegistry::with_defaults`].
    pub fn shared() -> Arc<BackendRegistry> {
        Arc::clone(&DEFAULT)
    }

    /// Add or replace a backend under its own name.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.backends.keys().copied()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
