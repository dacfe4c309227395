//! Fail-safe rendering of templates, macros and resolved objects.
//!
//! [`RenderDispatcher`] is the boundary between callers and the template
//! engine. Every operation returns a [`RenderOutput`]: the rendered content,
//! or empty content plus a [`RenderErrorDetail`]. No engine error or panic
//! escapes.
//!
//! # Error Classification
//!
//! | Engine failure | Template render | Macro render |
//! |----------------|-----------------|--------------|
//! | missing template | `TemplateNotFound` | `TemplateNotFound` |
//! | undefined binding | `UndefinedVariable` | `UndefinedVariable` |
//! | malformed source | `TemplateSyntaxError` | `TemplateSyntaxError` |
//! | argument binding | `EngineError` | `MacroArgumentError` |
//! | anything else | `EngineError` | `EngineError` |
//!
//! A macro the template does not define is reported as `MacroNotFound`
//! before the macro would run.
//!
//! # Contexts
//!
//! The caller's context is borrowed and never modified. Each render works on
//! its own copy, which gets `debug_mode` for template renders and, for
//! [`render_object`](RenderDispatcher::render_object), the object itself under
//! the configured key (`object` by default) unless the caller already set it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

use crate::config::DispatcherConfig;
use crate::engine::{EngineError, EngineErrorKind, TemplateEngine};
use crate::error::{RenderErrorDetail, RenderErrorKind};
use crate::object::{Renderable, SecondaryType, Variation};
use crate::registry::{Registry, ResolutionTrace};
use crate::target::RenderTarget;
use crate::Context;

/// Result of a render: content, or empty content and an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub content: String,
    pub error: Option<RenderErrorDetail>,
}

impl RenderOutput {
    pub fn ok(content: String) -> Self {
        Self {
            content,
            error: None,
        }
    }

    pub fn failed(error: RenderErrorDetail) -> Self {
        Self {
            content: String::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<RenderErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn into_result(self) -> Result<String, RenderErrorDetail> {
        match self.error {
            None => Ok(self.content),
            Some(err) => Err(err),
        }
    }
}

/// Resolution and render diagnostics for one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDebugReport {
    pub resolution: ResolutionTrace,
    pub render_success: bool,
    pub render_error: Option<RenderErrorDetail>,
    pub content_length: usize,
    pub context_keys: Vec<String>,
}

/// Renders through a [`TemplateEngine`], resolving objects with a [`Registry`].
pub struct RenderDispatcher {
    engine: Box<dyn TemplateEngine>,
    registry: Registry,
    debug_mode: bool,
    object_key: String,
}

impl RenderDispatcher {
    pub fn new(engine: impl TemplateEngine + 'static, registry: Registry) -> Self {
        Self::with_config(engine, registry, &DispatcherConfig::default())
    }

    pub fn with_config(
        engine: impl TemplateEngine + 'static,
        registry: Registry,
        config: &DispatcherConfig,
    ) -> Self {
        let mut dispatcher = Self {
            engine: Box::new(engine),
            registry,
            debug_mode: false,
            object_key: config.object_key.clone(),
        };
        dispatcher.set_debug_mode(config.debug_mode);
        dispatcher
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn engine(&self) -> &dyn TemplateEngine {
        self.engine.as_ref()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Toggles the `debug_mode` template global and `debug_var` logging.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
        self.engine.set_debug_mode(enabled);
    }

    /// Renders the template at `path`.
    pub fn render_template(&self, path: &str, context: &Context) -> RenderOutput {
        let mut bindings = context.clone();
        bindings
            .entry("debug_mode")
            .or_insert(serde_json::Value::Bool(self.debug_mode));

        match guard(|| self.engine.render(path, &bindings)) {
            Ok(content) => RenderOutput::ok(content),
            Err(err) => {
                tracing::debug!(template = path, error = %err.message, "template render failed");
                RenderOutput::failed(classify(err, path, None, &bindings))
            }
        }
    }

    /// Renders macro `macro_name` of the template at `template_path`, passing
    /// the context entries as keyword arguments.
    pub fn render_macro(&self, template_path: &str, macro_name: &str, context: &Context) -> RenderOutput {
        let bindings = context.clone();

        match guard(|| self.engine.call_macro(template_path, macro_name, &bindings)) {
            Ok(Some(content)) => RenderOutput::ok(content),
            Ok(None) => RenderOutput::failed(
                RenderErrorDetail::new(
                    RenderErrorKind::MacroNotFound,
                    format!(
                        "Macro '{}' not found in template '{}'",
                        macro_name, template_path
                    ),
                )
                .with_template(template_path)
                .with_macro(macro_name)
                .with_context(&bindings),
            ),
            Err(err) => {
                tracing::debug!(
                    template = template_path,
                    macro_name,
                    error = %err.message,
                    "macro render failed",
                );
                RenderOutput::failed(classify(err, template_path, Some(macro_name), &bindings))
            }
        }
    }

    /// Resolves `object` through the registry and renders the result.
    pub fn render_object(
        &self,
        object: &dyn Renderable,
        context: &Context,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> RenderOutput {
        let target = self.registry.resolve(object, secondary, variation);

        let mut bindings = context.clone();
        if !bindings.contains_key(&self.object_key) {
            match object.to_context_value() {
                Ok(value) => {
                    bindings.insert(self.object_key.clone(), value);
                }
                Err(err) => {
                    let mut detail = RenderErrorDetail::new(
                        RenderErrorKind::EngineError,
                        format!("failed to serialize {}: {}", object.type_name(), err),
                    )
                    .with_template(target.template_path())
                    .with_context(context);
                    if let Some(name) = target.macro_name() {
                        detail = detail.with_macro(name);
                    }
                    return RenderOutput::failed(detail);
                }
            }
        }

        match &target {
            RenderTarget::TemplateRef { path } => self.render_template(path, &bindings),
            RenderTarget::MacroRef {
                template_path,
                macro_name,
            } => self.render_macro(template_path, macro_name, &bindings),
        }
    }

    /// Renders `object` and reports how it was resolved.
    pub fn debug_render_object(
        &self,
        object: &dyn Renderable,
        context: &Context,
        secondary: Option<&SecondaryType>,
        variation: Option<&Variation>,
    ) -> RenderDebugReport {
        let resolution = self.registry.debug_resolve(object, secondary, variation);
        let output = self.render_object(object, context, secondary, variation);

        RenderDebugReport {
            resolution,
            render_success: output.is_ok(),
            content_length: output.content.len(),
            render_error: output.error,
            context_keys: context.keys().cloned().collect(),
        }
    }
}

impl fmt::Display for RenderDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RenderDispatcher(debug_mode={}, registry={})",
            self.debug_mode, self.registry
        )
    }
}

/// Runs an engine call, turning a panic into an engine error.
fn guard<T>(call: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(EngineError::new(
                EngineErrorKind::Other,
                format!("template engine panicked: {}", reason),
            ))
        }
    }
}

fn classify(
    err: EngineError,
    template: &str,
    macro_name: Option<&str>,
    bindings: &Context,
) -> RenderErrorDetail {
    let (kind, message, trace) = match (err.kind, macro_name) {
        (EngineErrorKind::TemplateNotFound, _) => (
            RenderErrorKind::TemplateNotFound,
            format!(
                "Template '{}' not found in template search path: {}",
                template, err.message
            ),
            Vec::new(),
        ),
        (EngineErrorKind::UndefinedVariable, _) => {
            (RenderErrorKind::UndefinedVariable, err.message, err.chain)
        }
        (EngineErrorKind::Syntax, _) => {
            (RenderErrorKind::TemplateSyntaxError, err.message, err.chain)
        }
        (EngineErrorKind::ArgumentBinding, Some(name)) => (
            RenderErrorKind::MacroArgumentError,
            format!("Macro '{}' called with wrong arguments: {}", name, err.message),
            Vec::new(),
        ),
        (EngineErrorKind::ArgumentBinding, None) | (EngineErrorKind::Other, _) => {
            (RenderErrorKind::EngineError, err.message, err.chain)
        }
    };

    let mut detail = RenderErrorDetail::new(kind, message)
        .with_template(template)
        .with_line(err.line)
        .with_context(bindings)
        .with_stack_trace(trace);
    if let Some(name) = macro_name {
        detail = detail.with_macro(name);
    }
    detail
}
