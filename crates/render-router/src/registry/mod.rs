//! Object-to-target resolution.
//!
//! [`Registry`] answers one question: given an object, and optionally a
//! secondary type and a variation, which [`RenderTarget`] renders it?
//!
//! # Resolution Order
//!
//! 1. **Registrations**, tried from the most to the least specific key:
//!
//!    | Tier | Key |
//!    |------|-----|
//!    | 1 | `(type, secondary, variation)` |
//!    | 2 | `(type, secondary)` |
//!    | 3 | `(type, variation)` |
//!    | 4 | `(type)` |
//!
//!    A secondary-only registration outranks a variation-only one.
//! 2. **Pattern resolvers**, in registration order. The first `Some` wins; a
//!    resolver that errors or panics is logged and skipped.
//! 3. **Convention**: `type[/secondary][/variation].html`
//!    (see [`crate::convention`]).
//!
//! Resolution always yields a target.
//!
//! # Caching
//!
//! Table lookups (including "not registered" outcomes) are cached per key in
//! a bounded LRU. Any change to the table clears the cache. Resolver and
//! convention results are never cached.
//!
//! # Example
//!
//! ```rust
//! use render_router::{KeyRefinements, Registry, RenderTarget};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct School { name: String }
//!
//! let mut registry = Registry::new();
//! let school = School { name: "Tech".into() };
//!
//! assert_eq!(registry.resolve(&school, None, None), RenderTarget::template("school.html"));
//!
//! registry
//!     .register_template::<School>(KeyRefinements::new(), "school/dashboard.html")
//!     .unwrap();
//! assert_eq!(
//!     registry.resolve(&school, None, None),
//!     RenderTarget::template("school/dashboard.html"),
//! );
//! ```

mod resolver;
mod trace;

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::cache::{CacheStats, ResolutionCache};
use crate::config::RegistryConfig;
use crate::convention::NameConvention;
use crate::error::RegistryError;
use crate::key::{KeyRefinements, RegistrationKey};
use crate::object::{type_name_of, Renderable, SecondaryType, Variation};
use crate::target::{Registration, RenderTarget};

pub use resolver::{PatternResolver, ResolverError};
pub use trace::{CandidateTrace, ResolutionSource, ResolutionTrace};

/// Registration table, pattern resolver chain and lookup cache.
///
/// Mutation takes `&mut self`; `resolve` takes `&self` and may be called from
/// several threads once the table is stable.
pub struct Registry {
    registrations: HashMap<RegistrationKey, Registration>,
    patterns: Vec<PatternResolver>,
    cache: Mutex<ResolutionCache>,
    convention: NameConvention,
}

impl Registry {
    /// Creates an empty registry with default settings.
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            registrations: HashMap::new(),
            patterns: Vec::new(),
            cache: Mutex::new(ResolutionCache::new(config.cache_capacity)),
            convention: NameConvention::new(config.extension.clone()),
        }
    }

    pub fn convention(&self) -> &NameConvention {
        &self.convention
    }

    /// Registers `target` for objects of type `T`, refined by `refinements`.
    ///
    /// An existing registration for the same key is replaced.
    ///
    /// # Errors
    ///
    /// Rejects an empty template path or an empty macro name.
    pub fn register<T: ?Sized>(
        &mut self,
        refinements: KeyRefinements,
        target: RenderTarget,
    ) -> Result<(), RegistryError> {
        self.register_for(type_name_of::<T>(), refinements, target)
    }

    /// Like [`register`](Self::register), with an explicit primary type name.
    pub fn register_for(
        &mut self,
        type_name: &str,
        refinements: KeyRefinements,
        target: RenderTarget,
    ) -> Result<(), RegistryError> {
        let key = RegistrationKey::refined(type_name, &refinements);
        validate(&key, &target)?;

        tracing::debug!(key = %key, target = %target, "registering render target");
        self.registrations
            .insert(key.clone(), Registration { key, target });
        self.cache.lock().clear();
        Ok(())
    }

    /// Registers a whole-template target for `T`.
    pub fn register_template<T: ?Sized>(
        &mut self,
        refinements: KeyRefinements,
        path: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.register::<T>(refinements, RenderTarget::template(path))
    }

    /// Registers a macro target for `T`.
    ///
    /// Without an explicit `template_path` the macro is looked up in the
    /// convention path of its own key.
    pub fn register_macro<T: ?Sized>(
        &mut self,
        refinements: KeyRefinements,
        macro_name: impl Into<String>,
        template_path: Option<&str>,
    ) -> Result<(), RegistryError> {
        let template_path = match template_path {
            Some(path) => path.to_string(),
            None => {
                let key = RegistrationKey::refined(type_name_of::<T>(), &refinements);
                self.convention_path(&key)
            }
        };
        self.register::<T>(refinements, RenderTarget::macro_in(template_path, macro_name))
    }

    /// Removes the registration for `T` and `refinements`.
    ///
    /// Returns whether anything was removed. The cache is only cleared when
    /// the table changed.
    pub fn unregister<T: ?Sized>(&mut self, refinements: KeyRefinements) -> bool {
        self.unregister_for(type_name_of::<T>(), refinements)
    }

    /// Like [`unregister`](Self::unregister), with an explicit primary type name.
    pub fn unregister_for(&mut self, type_name: &str, refinements: KeyRefinements) -> bool {
        let key = RegistrationKey::refined(type_name, &refinements);
        let removed = self.registrations.remove(&key).is_some();
        if removed {
            tracing::debug!(key = %key, "unregistered render target");
            self.cache.lock().clear();
        }
        removed
    }

    /// Drops every registration and every pattern resolver.
    pub fn clear(&mut self) {
        tracing::debug!(
            registrations = self.registrations.len(),
            patterns = self.patterns.len(),
            "clearing registry",
        );
        self.registrations.clear();
        self.patterns.clear();
        self.cache.lock().clear();
    }

    /// Appends a resolver to the chain.
    pub fn register_pattern(&mut self, resolver: PatternResolver) {
        self.patterns.push(resolver);
    }

    /// All registrations, ordered by key.
    pub fn registrations(&self) -> Vec<&Registration> {
        let mut all: Vec<&Registration> = self.registrations.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Looks up the registration stored under an exact key.
    pub fn registration(&self, key: &RegistrationKey) -> Option<&Registration> {
        self.registrations.get(key)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Resolves `object` to a render target. Never fails.
    pub fn resolve(
        &self,
        object: &dyn Renderable,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> RenderTarget {
        self.resolve_with_source(object, secondary, variation).0
    }

    /// Resolves `object` and reports every step of the lookup.
    pub fn debug_resolve(
        &self,
        object: &dyn Renderable,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> ResolutionTrace {
        let key = lookup_key(object, secondary, variation);
        let candidates = key
            .candidates()
            .into_iter()
            .map(|candidate| {
                let target = self
                    .registrations
                    .get(&candidate)
                    .map(|r| r.target.clone());
                CandidateTrace {
                    display: candidate.to_string(),
                    key: candidate,
                    found: target.is_some(),
                    target,
                }
            })
            .collect();

        let (resolved, source) = self.resolve_with_source(object, secondary, variation);

        ResolutionTrace {
            object_type: key.primary,
            secondary: key.secondary,
            variation: key.variation,
            candidates,
            resolver_count: self.patterns.len(),
            resolved,
            source,
            cache: self.cache_stats(),
        }
    }

    fn resolve_with_source(
        &self,
        object: &dyn Renderable,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> (RenderTarget, ResolutionSource) {
        let key = lookup_key(object, secondary, variation);

        if let Some(target) = self.lookup_registered(&key) {
            tracing::debug!(key = %key, target = %target, "resolved from registration");
            return (target, ResolutionSource::Registration);
        }

        for (index, resolver) in self.patterns.iter().enumerate() {
            if let Some(target) = resolver.try_resolve(index, object, secondary, variation) {
                tracing::debug!(key = %key, resolver = index, target = %target, "resolved by pattern");
                return (target, ResolutionSource::Pattern(index));
            }
        }

        let target = RenderTarget::template(self.convention_path(&key));
        tracing::debug!(key = %key, target = %target, "resolved by convention");
        (target, ResolutionSource::Convention)
    }

    /// Walks the candidate keys through the cache and the table.
    fn lookup_registered(&self, key: &RegistrationKey) -> Option<RenderTarget> {
        let mut cache = self.cache.lock();
        for candidate in key.candidates() {
            let outcome = match cache.get(&candidate) {
                Some(cached) => cached,
                None => {
                    let found = self
                        .registrations
                        .get(&candidate)
                        .map(|r| r.target.clone());
                    cache.put(candidate, found.clone());
                    found
                }
            };
            if outcome.is_some() {
                return outcome;
            }
        }
        None
    }

    fn convention_path(&self, key: &RegistrationKey) -> String {
        self.convention.path(
            &key.primary,
            key.secondary.as_deref(),
            key.variation.as_deref(),
        )
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("registrations", &self.registrations.len())
            .field("patterns", &self.patterns)
            .field("cache", &self.cache_stats())
            .field("convention", &self.convention)
            .finish()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.cache_stats();
        write!(
            f,
            "Registry(registrations={}, patterns={}, cache={}/{})",
            self.registrations.len(),
            self.patterns.len(),
            stats.hits,
            stats.size
        )
    }
}

fn lookup_key(
    object: &dyn Renderable,
    secondary: Option<&SecondaryType>,
    variation: Option<&Variation>,
) -> RegistrationKey {
    RegistrationKey::new(
        object.type_name(),
        secondary.map(|s| s.name().to_string()),
        variation.map(|v| v.normalized().to_string()),
    )
}

fn validate(key: &RegistrationKey, target: &RenderTarget) -> Result<(), RegistryError> {
    if target.template_path().is_empty() {
        return Err(RegistryError::EmptyTemplatePath {
            key: key.to_string(),
        });
    }
    if target.macro_name().is_some_and(str::is_empty) {
        return Err(RegistryError::EmptyMacroName {
            key: key.to_string(),
        });
    }
    Ok(())
}
