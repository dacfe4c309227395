//! Diagnostics for a single resolution.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::key::RegistrationKey;
use crate::target::RenderTarget;

/// Which tier of the lookup produced the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "index", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// An explicit registration.
    Registration,
    /// The pattern resolver at this position in the chain.
    Pattern(usize),
    /// The naming convention.
    Convention,
}

/// One candidate key and whether the table holds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTrace {
    pub key: RegistrationKey,
    pub display: String,
    pub found: bool,
    pub target: Option<RenderTarget>,
}

/// Report returned by [`Registry::debug_resolve`](crate::Registry::debug_resolve).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionTrace {
    pub object_type: String,
    pub secondary: Option<String>,
    pub variation: Option<String>,
    /// Candidates in lookup order, most specific first.
    pub candidates: Vec<CandidateTrace>,
    pub resolver_count: usize,
    pub resolved: RenderTarget,
    pub source: ResolutionSource,
    pub cache: CacheStats,
}
