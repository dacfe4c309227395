//! Error types.
//!
//! Rendering never fails with a Rust error. Every engine failure is converted
//! into a [`RenderErrorDetail`] carrying one of the [`RenderErrorKind`]s and
//! returned as data alongside empty content. The only `Result`-returning
//! operations are configuration-time ones: registering an invalid target
//! ([`RegistryError`]) and setting up an engine
//! ([`EngineSetupError`](crate::engine::EngineSetupError)).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Context;

/// The closed set of rendering failures.
///
/// `Display` prints the variant name, which is also its serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RenderErrorKind {
    /// The template path does not exist in the engine's search path.
    #[error("TemplateNotFound")]
    TemplateNotFound,
    /// The template referenced a binding absent from the context.
    #[error("UndefinedVariable")]
    UndefinedVariable,
    /// The template source is malformed.
    #[error("TemplateSyntaxError")]
    TemplateSyntaxError,
    /// The macro is not defined by the template.
    #[error("MacroNotFound")]
    MacroNotFound,
    /// The macro exists but rejected the supplied arguments.
    #[error("MacroArgumentError")]
    MacroArgumentError,
    /// Any other engine failure.
    #[error("EngineError")]
    EngineError,
}

/// Summary of a render context: key to type-and-size (or scalar value).
///
/// Raw values never appear, except for numbers, booleans and null, which are
/// shown inline. Strings only report their type. Keys starting with `_` are
/// treated as private and omitted.
///
/// | Value | Summary |
/// |-------|---------|
/// | `"hello"` | `string` |
/// | `42` | `integer(42)` |
/// | `1.5` | `float(1.5)` |
/// | `true` | `bool(true)` |
/// | `null` | `null` |
/// | `[1, 2, 3]` | `array[3]` |
/// | `{"a": 1}` | `object[1]` |
pub type ContextFingerprint = BTreeMap<String, String>;

/// Builds the [`ContextFingerprint`] of a context.
pub fn fingerprint(context: &Context) -> ContextFingerprint {
    context
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| (key.clone(), summarize(value)))
        .collect()
}

fn summarize(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool({})", b),
        Value::Number(n) if n.is_f64() => format!("float({})", n),
        Value::Number(n) => format!("integer({})", n),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => format!("object[{}]", map.len()),
    }
}

/// Diagnostics captured for a single failed render.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}: {message}{}", location(.template_name, .macro_name, .line_number))]
pub struct RenderErrorDetail {
    pub kind: RenderErrorKind,
    pub message: String,
    pub template_name: Option<String>,
    pub macro_name: Option<String>,
    pub line_number: Option<usize>,
    pub context_fingerprint: Option<ContextFingerprint>,
    pub stack_trace: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

impl RenderErrorDetail {
    pub fn new(kind: RenderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            template_name: None,
            macro_name: None,
            line_number: None,
            context_fingerprint: None,
            stack_trace: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    pub fn with_macro(mut self, name: impl Into<String>) -> Self {
        self.macro_name = Some(name.into());
        self
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line_number = line;
        self
    }

    /// Records the fingerprint of `context`.
    pub fn with_context(mut self, context: &Context) -> Self {
        self.context_fingerprint = Some(fingerprint(context));
        self
    }

    /// Records a stack trace, ignoring an empty one.
    pub fn with_stack_trace(mut self, trace: Vec<String>) -> Self {
        if !trace.is_empty() {
            self.stack_trace = Some(trace);
        }
        self
    }
}

fn location(
    template: &Option<String>,
    macro_name: &Option<String>,
    line: &Option<usize>,
) -> String {
    let mut out = match (template, macro_name) {
        (Some(template), Some(name)) => format!(" ({}#{})", template, name),
        (Some(template), None) => format!(" ({})", template),
        _ => String::new(),
    };
    if let Some(line) = line {
        out.push_str(&format!(" at line {}", line));
    }
    out
}

/// Invalid registration passed to the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A macro target was given an empty macro name.
    #[error("macro registration for {key} requires a non-empty macro name")]
    EmptyMacroName { key: String },

    /// A target was given an empty template path.
    #[error("registration for {key} requires a non-empty template path")]
    EmptyTemplatePath { key: String },
}
