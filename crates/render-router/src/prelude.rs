//! Convenient imports for the common case.
//!
//! ```rust
//! use render_router::prelude::*;
//! ```

pub use crate::{
    Context, KeyRefinements, MiniJinjaEngine, PatternResolver, Registry, RenderDispatcher,
    RenderErrorDetail, RenderErrorKind, RenderOutput, RenderTarget, Renderable, SecondaryType,
    TemplateEngine, Variation,
};
