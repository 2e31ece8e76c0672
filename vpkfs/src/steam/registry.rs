//! Process-scoped sharing of install resolvers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::resolver::InstallResolver;
use crate::storage::StorageSource;

/// Shares one [`InstallResolver`] per (storage backend, Steam root) pair.
///
/// # Lifetime
///
/// Entries are created on first request and never evicted. Create one
/// registry per process (or per test) and pass it by `Arc` to every
/// [`GameFilesystem`](crate::game::GameFilesystem) that needs install lookups.
///
/// Backend identity is the address of the `Arc` allocation. Each registered
/// resolver holds a clone of that `Arc`, so the address cannot be reused
/// while the entry exists.
#[derive(Debug, Default)]
pub struct ResolverRegistry {
    resolvers: Mutex<HashMap<(usize, String), Arc<InstallResolver>>>,
}

impl ResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the shared resolver for `source` and `root`, creating it on first use.
    pub fn resolver(&self, source: &Arc<dyn StorageSource>, root: &str) -> Arc<InstallResolver> {
        let identity = Arc::as_ptr(source) as *const () as usize;
        let root = root.replace('\\', "/");
        let mut resolvers = self.resolvers.lock();
        let resolver = resolvers
            .entry((identity, root.clone()))
            .or_insert_with(|| Arc::new(InstallResolver::new(Arc::clone(source), root)));
        Arc::clone(resolver)
    }

    /// Number of resolvers created so far.
    pub fn len(&self) -> usize {
        self.resolvers.lock().len()
    }

    /// Whether no resolver has been created yet.
    pub fn is_empty(&self) -> bool {
        self.resolvers.lock().is_empty()
    }
}
