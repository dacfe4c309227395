//! Template engine abstraction.
//!
//! The dispatcher talks to the template language only through the
//! [`TemplateEngine`] trait. Engine failures come back as [`EngineError`]s,
//! already sorted into an [`EngineErrorKind`]; the dispatcher then maps them
//! onto the public error taxonomy.
//!
//! The default implementation is [`MiniJinjaEngine`], which loads templates
//! from a directory (and/or inline sources) and evaluates them with strict
//! undefined handling, so a reference to a missing binding is an error rather
//! than an empty string.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use minijinja::value::Kwargs;
use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};

use crate::Context;

/// A template engine the dispatcher can render through.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template at `path` with `bindings` as its context.
    fn render(&self, path: &str, bindings: &Context) -> Result<String, EngineError>;

    /// Evaluates the template at `path` and calls its macro `name`, passing
    /// every binding as a keyword argument.
    ///
    /// Returns `Ok(None)` when the template does not define the macro; the
    /// macro is never invoked in that case.
    fn call_macro(
        &self,
        path: &str,
        name: &str,
        bindings: &Context,
    ) -> Result<Option<String>, EngineError>;

    /// Toggles engine-side debug helpers.
    fn set_debug_mode(&mut self, _enabled: bool) {}
}

/// Engine-level failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    TemplateNotFound,
    UndefinedVariable,
    Syntax,
    /// Arguments could not be bound to a callable (arity or keyword mismatch).
    ArgumentBinding,
    Other,
}

/// An error raised by a [`TemplateEngine`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
    pub template_name: Option<String>,
    pub line: Option<usize>,
    /// Rendered error with debug info and its source chain, one entry per line.
    pub chain: Vec<String>,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            template_name: None,
            line: None,
            chain: Vec::new(),
        }
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        let message = err.to_string();
        let kind = match err.kind() {
            ErrorKind::TemplateNotFound => EngineErrorKind::TemplateNotFound,
            ErrorKind::UndefinedError => EngineErrorKind::UndefinedVariable,
            ErrorKind::SyntaxError | ErrorKind::BadEscape => EngineErrorKind::Syntax,
            ErrorKind::TooManyArguments | ErrorKind::MissingArgument
                if is_call_boundary(&err, &message) =>
            {
                EngineErrorKind::ArgumentBinding
            }
            ErrorKind::InvalidOperation
                if message.to_lowercase().contains("argument")
                    && is_call_boundary(&err, &message) =>
            {
                EngineErrorKind::ArgumentBinding
            }
            _ => EngineErrorKind::Other,
        };

        let mut chain: Vec<String> = format!("{:#}", err).lines().map(String::from).collect();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            kind,
            message,
            template_name: err.name().map(String::from),
            line: err.line(),
            chain,
        }
    }
}

/// Argument errors raised while binding a call carry no source line; the same
/// error kinds raised from a filter or function inside a template body do.
fn is_call_boundary(err: &minijinja::Error, message: &str) -> bool {
    err.line().is_none() || message.contains("unknown keyword argument")
}

/// Failure to construct an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineSetupError {
    #[error("template directory '{0}' does not exist")]
    DirectoryNotFound(String),

    #[error("template path '{0}' is not a directory")]
    NotADirectory(String),
}

/// MiniJinja-backed [`TemplateEngine`].
///
/// ```rust
/// use render_router::engine::{MiniJinjaEngine, TemplateEngine};
///
/// let mut engine = MiniJinjaEngine::new();
/// engine.add_template("hello.html", "Hello, {{ name }}!").unwrap();
///
/// let mut ctx = render_router::Context::new();
/// ctx.insert("name".into(), "World".into());
/// assert_eq!(engine.render("hello.html", &ctx).unwrap(), "Hello, World!");
/// ```
///
/// Templates can use three helpers:
///
/// - `debug_mode`: global flag mirroring [`set_debug_mode`](TemplateEngine::set_debug_mode)
/// - `debug_var(value, name)`: returns `value`, logging it at info level in debug mode
/// - `safe_get(obj, key, default)`: item/attribute access that yields `default` instead of failing
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    debug: Arc<AtomicBool>,
}

impl MiniJinjaEngine {
    /// Creates an engine with no loader; templates must be added inline.
    pub fn new() -> Self {
        let debug = Arc::new(AtomicBool::new(false));
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        register_helpers(&mut env, Arc::clone(&debug));
        Self { env, debug }
    }

    /// Creates an engine that loads templates from `dir`.
    ///
    /// # Errors
    ///
    /// Fails if `dir` does not exist or is not a directory.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, EngineSetupError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(EngineSetupError::DirectoryNotFound(dir.display().to_string()));
        }
        if !dir.is_dir() {
            return Err(EngineSetupError::NotADirectory(dir.display().to_string()));
        }

        let mut engine = Self::new();
        engine.env.set_loader(minijinja::path_loader(dir.to_path_buf()));
        Ok(engine)
    }

    /// Replaces the undefined-variable policy (strict by default).
    pub fn with_undefined(mut self, behavior: UndefinedBehavior) -> Self {
        self.env.set_undefined_behavior(behavior);
        self
    }

    /// Adds a named inline template, shadowing a loader file of the same name.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), EngineError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    /// The underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Mutable access for registering custom filters, functions or globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, path: &str, bindings: &Context) -> Result<String, EngineError> {
        let tmpl = self.env.get_template(path)?;
        Ok(tmpl.render(bindings)?)
    }

    fn call_macro(
        &self,
        path: &str,
        name: &str,
        bindings: &Context,
    ) -> Result<Option<String>, EngineError> {
        let tmpl = self.env.get_template(path)?;
        let state = tmpl.eval_to_state(bindings)?;
        if !state.exports().contains(&name) {
            return Ok(None);
        }

        let args: Vec<Value> = if bindings.is_empty() {
            Vec::new()
        } else {
            let kwargs: Kwargs = bindings
                .iter()
                .map(|(key, value)| (key.as_str(), Value::from_serialize(value)))
                .collect();
            vec![Value::from(kwargs)]
        };
        Ok(Some(state.call_macro(name, &args)?))
    }

    fn set_debug_mode(&mut self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
        self.env.add_global("debug_mode", enabled);
    }
}

fn register_helpers(env: &mut Environment<'static>, debug: Arc<AtomicBool>) {
    env.add_global("debug_mode", false);

    env.add_function(
        "debug_var",
        move |value: Value, name: Option<String>| -> Value {
            if debug.load(Ordering::Relaxed) {
                tracing::info!(
                    name = name.as_deref().unwrap_or("unknown"),
                    kind = ?value.kind(),
                    value = %value,
                    "template variable",
                );
            }
            value
        },
    );

    env.add_function(
        "safe_get",
        |obj: Value, key: Value, default: Option<Value>| -> Value {
            match obj.get_item(&key) {
                Ok(found) if !found.is_undefined() => found,
                _ => default.unwrap_or_else(|| Value::from(())),
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> Context {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Context::new(),
        }
    }

    fn engine_with(name: &str, source: &str) -> MiniJinjaEngine {
        let mut engine = MiniJinjaEngine::new();
        engine.add_template(name, source).unwrap();
        engine
    }

    #[test]
    fn test_render_inline() {
        let engine = engine_with("greet.html", "Hello, {{ name }}!");
        let out = engine
            .render("greet.html", &ctx(json!({"name": "World"})))
            .unwrap();
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_missing_template() {
        let engine = MiniJinjaEngine::new();
        let err = engine.render("nope.html", &Context::new()).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_undefined_is_strict() {
        let engine = engine_with("page.html", "{{ missing }}");
        let err = engine.render("page.html", &Context::new()).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::UndefinedVariable);
        assert_eq!(err.template_name.as_deref(), Some("page.html"));
    }

    #[test]
    fn test_lenient_undefined() {
        let engine =
            engine_with("page.html", "[{{ missing }}]").with_undefined(UndefinedBehavior::Lenient);
        assert_eq!(engine.render("page.html", &Context::new()).unwrap(), "[]");
    }

    #[test]
    fn test_syntax_error_on_add() {
        let mut engine = MiniJinjaEngine::new();
        let err = engine
            .add_template("bad.html", "line one\n{% invalid syntax %}")
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::Syntax);
        assert_eq!(err.line, Some(2));
        assert!(!err.chain.is_empty());
    }

    #[test]
    fn test_call_macro() {
        let engine = engine_with(
            "macros.html",
            "{% macro card(name) %}<b>{{ name }}</b>{% endmacro %}",
        );
        let out = engine
            .call_macro("macros.html", "card", &ctx(json!({"name": "Ada"})))
            .unwrap();
        assert_eq!(out.as_deref(), Some("<b>Ada</b>"));
    }

    #[test]
    fn test_call_missing_macro() {
        let engine = engine_with("macros.html", "{% macro card(name) %}{% endmacro %}");
        let out = engine
            .call_macro("macros.html", "badge", &Context::new())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_macro_unknown_keyword() {
        let engine = engine_with(
            "macros.html",
            "{% macro card(name) %}{{ name }}{% endmacro %}",
        );
        let err = engine
            .call_macro(
                "macros.html",
                "card",
                &ctx(json!({"name": "Ada", "colour": "red"})),
            )
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::ArgumentBinding);
    }

    #[test]
    fn test_filter_arity_in_macro_body_is_not_binding() {
        let engine = engine_with(
            "macros.html",
            "{% macro card(name) %}{{ name|upper(1) }}{% endmacro %}",
        );
        let err = engine
            .call_macro("macros.html", "card", &ctx(json!({"name": "ada"})))
            .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::Other);
        assert!(err.line.is_some());
    }

    #[test]
    fn test_inline_templates_live_in_environment() {
        let engine = engine_with("page.html", "{{ 1 + 1 }}");
        let tmpl = engine.environment().get_template("page.html").unwrap();
        assert_eq!(tmpl.render(()).unwrap(), "2");
    }

    #[test]
    fn test_custom_filter_through_environment_mut() {
        let mut engine = engine_with("page.html", "{{ name|shout }}");
        engine
            .environment_mut()
            .add_filter("shout", |value: String| format!("{}!", value.to_uppercase()));
        let out = engine
            .render("page.html", &ctx(json!({"name": "ada"})))
            .unwrap();
        assert_eq!(out, "ADA!");
    }

    #[test]
    fn test_safe_get_helper() {
        let engine = engine_with(
            "page.html",
            "{{ safe_get(data, 'key1') }}|{{ safe_get(data, 'nope', 'default') }}|{{ safe_get(items, 0) }}|{{ safe_get(items, 10, 'none') }}",
        );
        let out = engine
            .render(
                "page.html",
                &ctx(json!({"data": {"key1": "value1"}, "items": ["item1"]})),
            )
            .unwrap();
        assert_eq!(out, "value1|default|item1|none");
    }

    #[test]
    fn test_debug_mode_global() {
        let mut engine = engine_with(
            "page.html",
            "{% if debug_mode %}on{% else %}off{% endif %}",
        );
        assert_eq!(engine.render("page.html", &Context::new()).unwrap(), "off");
        engine.set_debug_mode(true);
        assert_eq!(engine.render("page.html", &Context::new()).unwrap(), "on");
    }

    #[test]
    fn test_debug_var_returns_value() {
        let mut engine = engine_with("page.html", "{{ debug_var(title, 'title') }}");
        engine.set_debug_mode(true);
        let out = engine
            .render("page.html", &ctx(json!({"title": "Report"})))
            .unwrap();
        assert_eq!(out, "Report");
    }

    #[test]
    fn test_from_directory_validation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MiniJinjaEngine::from_directory(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        assert!(matches!(
            MiniJinjaEngine::from_directory(&missing),
            Err(EngineSetupError::DirectoryNotFound(_))
        ));

        let file = dir.path().join("file.html");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            MiniJinjaEngine::from_directory(&file),
            Err(EngineSetupError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_loads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("school")).unwrap();
        std::fs::write(dir.path().join("school/dashboard.html"), "{{ name }} dashboard").unwrap();

        let engine = MiniJinjaEngine::from_directory(dir.path()).unwrap();
        let out = engine
            .render("school/dashboard.html", &ctx(json!({"name": "Tech"})))
            .unwrap();
        assert_eq!(out, "Tech dashboard");
    }
}
