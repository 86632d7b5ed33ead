//! engine::filter
//!
//! The filter contract and the registry that resolves filter keys to instances.
//!
//! # Architecture
//!
//! Commands and the host refer to filters by [`FilterKey`] only. The registry
//! maps each key to either a shared instance or a factory that produces one
//! per resolution. A key with no registration is not an error: the pipeline
//! skips it.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use cmdhost::engine::{CommandContext, CommandError, CommandFilter, FilterRegistry, Next};
//! use cmdhost::core::types::FilterKey;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl CommandFilter for Audit {
//!     async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError> {
//!         tracing::info!(command = ctx.invocation().command_name(), "audit");
//!         next.run(ctx).await
//!     }
//! }
//!
//! let mut registry = FilterRegistry::new();
//! registry.register(Audit);
//! assert!(registry.resolve(&FilterKey::of::<Audit>()).is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::context::CommandContext;
use super::pipeline::Next;
use super::CommandError;
use crate::core::types::FilterKey;

/// Cross-cutting behavior wrapped around a command invocation.
///
/// A filter continues the pipeline by awaiting `next.run(ctx)`. Code before
/// that call runs on the way in, code after it on the way out. A filter that
/// returns without calling `next` short-circuits everything after it,
/// including binding and the handler.
#[async_trait]
pub trait CommandFilter: Send + Sync + 'static {
    async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError>;
}

type Factory = Arc<dyn Fn() -> Arc<dyn CommandFilter> + Send + Sync>;

#[derive(Clone)]
enum Registration {
    Shared(Arc<dyn CommandFilter>),
    Factory(Factory),
}

/// Resolves filter keys to filter instances.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    entries: HashMap<FilterKey, Registration>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared instance under its own type.
    pub fn register<F: CommandFilter>(&mut self, filter: F) -> &mut Self {
        self.provide::<F, F>(filter)
    }

    /// Register a shared instance under key type `K`.
    ///
    /// Lets a marker type named in declarations stand for a concrete filter.
    pub fn provide<K: ?Sized + 'static, F: CommandFilter>(&mut self, filter: F) -> &mut Self {
        self.entries
            .insert(FilterKey::of::<K>(), Registration::Shared(Arc::new(filter)));
        self
    }

    /// Register a factory under the filter's own type; every resolution gets a new instance.
    pub fn register_factory<F, M>(&mut self, make: M) -> &mut Self
    where
        F: CommandFilter,
        M: Fn() -> F + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(make()) as Arc<dyn CommandFilter>);
        self.entries
            .insert(FilterKey::of::<F>(), Registration::Factory(factory));
        self
    }

    /// The filter registered under `key`, if any.
    pub fn resolve(&self, key: &FilterKey) -> Option<Arc<dyn CommandFilter>> {
        match self.entries.get(key)? {
            Registration::Shared(filter) => Some(Arc::clone(filter)),
            Registration::Factory(make) => Some(make()),
        }
    }

    pub fn contains(&self, key: &FilterKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Pass;

    #[async_trait]
    impl CommandFilter for Pass {
        async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError> {
            next.run(ctx).await
        }
    }

    struct Marker;

    #[test]
    fn shared_instance_is_reused() {
        let mut registry = FilterRegistry::new();
        registry.register(Pass);
        let key = FilterKey::of::<Pass>();
        let a = registry.resolve(&key).unwrap();
        let b = registry.resolve(&key).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn factory_builds_per_resolution() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let mut registry = FilterRegistry::new();
        registry.register_factory(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Pass
        });
        let key = FilterKey::of::<Pass>();
        registry.resolve(&key).unwrap();
        registry.resolve(&key).unwrap();
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn marker_key_resolves_provided_filter() {
        let mut registry = FilterRegistry::new();
        registry.provide::<Marker, _>(Pass);
        assert!(registry.contains(&FilterKey::of::<Marker>()));
        assert!(!registry.contains(&FilterKey::of::<Pass>()));
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let registry = FilterRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve(&FilterKey::of::<Pass>()).is_none());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = FilterRegistry::new();
        registry.register(Pass).register(Pass);
        assert_eq!(registry.len(), 1);
    }
}
