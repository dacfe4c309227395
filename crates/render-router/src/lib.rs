//! # Render Router - Object-Based Template Resolution
//!
//! `render-router` maps runtime objects to templates and renders them without
//! ever failing at the call site.
//!
//! ## Core Concepts
//!
//! - [`Registry`]: explicit registrations, pattern resolvers and a naming
//!   convention, consulted in that order
//! - [`RenderTarget`]: a template path, or a macro inside a template
//! - [`Variation`]: a dispatch tag such as a status; enum values normalize to
//!   their value
//! - [`RenderDispatcher`]: renders templates, macros and objects, returning
//!   structured [`RenderErrorDetail`]s instead of errors
//! - [`TemplateEngine`]: the engine seam, implemented by [`MiniJinjaEngine`]
//!
//! ## Quick Start
//!
//! ```rust
//! use render_router::{
//!     Context, KeyRefinements, MiniJinjaEngine, Registry, RenderDispatcher, Variation,
//! };
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Student { name: String }
//!
//! #[derive(Serialize)]
//! #[serde(rename_all = "lowercase")]
//! enum Status { Active }
//!
//! let mut engine = MiniJinjaEngine::new();
//! engine.add_template("student/active.html", "Active: {{ object.name }}").unwrap();
//! engine.add_template("student.html", "Student: {{ object.name }}").unwrap();
//!
//! let mut registry = Registry::new();
//! registry
//!     .register_template::<Student>(
//!         KeyRefinements::new().variation(Variation::of_enum(&Status::Active)),
//!         "student/active.html",
//!     )
//!     .unwrap();
//!
//! let dispatcher = RenderDispatcher::new(engine, registry);
//! let ada = Student { name: "Ada".into() };
//!
//! let variation = Variation::from("active");
//! let out = dispatcher.render_object(&ada, &Context::new(), None, Some(&variation));
//! assert_eq!(out.content, "Active: Ada");
//!
//! // No registration: the convention picks `student.html`.
//! let out = dispatcher.render_object(&ada, &Context::new(), None, None);
//! assert_eq!(out.content, "Student: Ada");
//! ```
//!
//! ## Failures Are Data
//!
//! ```rust
//! use render_router::{Context, MiniJinjaEngine, Registry, RenderDispatcher, RenderErrorKind};
//!
//! let dispatcher = RenderDispatcher::new(MiniJinjaEngine::new(), Registry::new());
//! let out = dispatcher.render_template("missing.html", &Context::new());
//!
//! assert_eq!(out.content, "");
//! assert_eq!(out.error_kind(), Some(RenderErrorKind::TemplateNotFound));
//! ```

pub mod cache;
pub mod config;
pub mod convention;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod key;
pub mod object;
pub mod prelude;
pub mod registry;
pub mod target;

/// Template context: a JSON object of named bindings.
pub type Context = serde_json::Map<String, serde_json::Value>;

pub use cache::{CacheStats, CachedLookup, ResolutionCache, DEFAULT_CACHE_CAPACITY};
pub use config::{ConfigError, DispatcherConfig, RegistryConfig, RenderRouterConfig};
pub use convention::{to_snake_case, NameConvention, DEFAULT_EXTENSION};
pub use dispatcher::{RenderDebugReport, RenderDispatcher, RenderOutput};
pub use engine::{EngineError, EngineErrorKind, EngineSetupError, MiniJinjaEngine, TemplateEngine};
pub use error::{fingerprint, ContextFingerprint, RegistryError, RenderErrorDetail, RenderErrorKind};
pub use key::{KeyRefinements, RegistrationKey};
pub use object::{type_name_of, Renderable, SecondaryType, Variation};
pub use registry::{
    CandidateTrace, PatternResolver, Registry, ResolutionSource, ResolutionTrace, ResolverError,
};
pub use target::{Registration, RenderTarget};
