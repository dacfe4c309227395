//! Pattern resolvers: programmable fallbacks between explicit registrations
//! and the naming convention.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::object::{Renderable, SecondaryType, Variation};
use crate::target::RenderTarget;

/// Failure reported by a pattern resolver. Logged and treated as "no match".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ResolverError(pub String);

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type ResolverFn = dyn Fn(
        &dyn Renderable,
        Option<&SecondaryType>,
        Option<&Variation>,
    ) -> Result<Option<RenderTarget>, ResolverError>
    + Send
    + Sync;

/// A resolver consulted when no registration matches.
///
/// Resolvers receive the live object together with the secondary type and
/// variation exactly as the caller passed them, so they can downcast and
/// inspect the value:
///
/// ```rust
/// use render_router::{PatternResolver, RenderTarget};
///
/// #[derive(serde::Serialize)]
/// struct Notice { urgent: bool }
///
/// let urgent = PatternResolver::new(|obj, _secondary, _variation| {
///     let notice = obj.as_any().downcast_ref::<Notice>()?;
///     notice.urgent.then(|| RenderTarget::template("notice/urgent.html"))
/// });
/// # let _ = urgent;
/// ```
pub struct PatternResolver {
    label: Option<String>,
    func: Box<ResolverFn>,
}

impl PatternResolver {
    /// Wraps a resolver that cannot fail.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Renderable, Option<&SecondaryType>, Option<&Variation>) -> Option<RenderTarget>
            + Send
            + Sync
            + 'static,
    {
        Self::fallible(move |obj, secondary, variation| Ok(f(obj, secondary, variation)))
    }

    /// Wraps a resolver that reports failures as [`ResolverError`].
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(
                &dyn Renderable,
                Option<&SecondaryType>,
                Option<&Variation>,
            ) -> Result<Option<RenderTarget>, ResolverError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            label: None,
            func: Box::new(f),
        }
    }

    /// Attaches a label used in log events.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Runs the resolver, converting errors and panics into `None`.
    pub(crate) fn try_resolve(
        &self,
        index: usize,
        object: &dyn Renderable,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> Option<RenderTarget> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            (self.func)(object, secondary, variation)
        }));

        let error = match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        tracing::warn!(
            resolver = index,
            label = self.label.as_deref().unwrap_or(""),
            object_type = object.type_name(),
            error = %error,
            "pattern resolver failed; treating as no match",
        );
        None
    }
}

impl fmt::Debug for PatternResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternResolver")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
