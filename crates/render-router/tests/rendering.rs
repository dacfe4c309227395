//! End-to-end rendering against templates loaded from disk.

use std::fs;
use std::path::Path;

use render_router::{
    Context, KeyRefinements, MiniJinjaEngine, Registry, RenderDispatcher, RenderErrorKind,
    RenderTarget, SecondaryType, Variation,
};
use serde::Serialize;
use serde_json::json;
use tempfile::TempDir;

#[derive(Serialize)]
struct Student {
    name: String,
    grade: u8,
}

struct Enrollment;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Active,
}

fn ctx(value: serde_json::Value) -> Context {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Context::new(),
    }
}

fn write(dir: &Path, name: &str, source: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, source).unwrap();
}

fn fixture() -> (TempDir, RenderDispatcher) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "greeting.html", "Hello, {{ name }}!");
    write(root, "uses_missing.html", "Value: {{ missing_variable }}");
    write(root, "broken.html", "line one\nline two\n{% if %}\n");
    write(root, "student.html", "Student {{ object.name }}");
    write(root, "student/active.html", "Active {{ object.name }} ({{ object.grade }})");
    write(
        root,
        "student/enrollment.html",
        "{{ object.name }} enrolled in {{ course }}",
    );
    write(
        root,
        "macros/student.html",
        "{% macro card(object) %}[{{ object.name }}]{% endmacro %}\
         {% macro badge(label) %}<{{ label }}>{% endmacro %}\
         {% macro shout(name) %}{{ name|upper(1) }}{% endmacro %}",
    );
    write(root, "debug.html", "{% if debug_mode %}debug{% else %}quiet{% endif %}");

    let engine = MiniJinjaEngine::from_directory(root).unwrap();
    (dir, RenderDispatcher::new(engine, Registry::new()))
}

fn ada() -> Student {
    Student {
        name: "Ada".into(),
        grade: 11,
    }
}

#[test]
fn renders_template_with_context() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_template("greeting.html", &ctx(json!({"name": "World"})));
    assert!(out.is_ok());
    assert_eq!(out.content, "Hello, World!");
}

#[test]
fn undefined_variable_is_reported_not_raised() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_template("uses_missing.html", &Context::new());

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::UndefinedVariable);
    assert_eq!(err.template_name.as_deref(), Some("uses_missing.html"));
    assert!(err.context_fingerprint.is_some());
}

#[test]
fn syntax_error_carries_line_number() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_template("broken.html", &Context::new());

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::TemplateSyntaxError);
    assert_eq!(err.line_number, Some(3));
}

#[test]
fn missing_template_is_reported() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_template("nope/missing.html", &Context::new());

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::TemplateNotFound);
    assert!(err.message.contains("nope/missing.html"));
}

#[test]
fn renders_macro_with_keyword_arguments() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_macro("macros/student.html", "badge", &ctx(json!({"label": "new"})));
    assert_eq!(out.content, "<new>");
    assert!(out.is_ok());
}

#[test]
fn missing_macro_is_reported() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_macro("macros/student.html", "nonexistent", &Context::new());

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::MacroNotFound);
    assert_eq!(err.macro_name.as_deref(), Some("nonexistent"));
    assert_eq!(err.template_name.as_deref(), Some("macros/student.html"));
}

#[test]
fn unexpected_macro_argument_is_reported() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_macro(
        "macros/student.html",
        "badge",
        &ctx(json!({"label": "new", "colour": "red"})),
    );

    assert_eq!(out.content, "");
    assert_eq!(out.error_kind(), Some(RenderErrorKind::MacroArgumentError));
}

#[test]
fn bad_filter_call_inside_macro_is_engine_error() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_macro("macros/student.html", "shout", &ctx(json!({"name": "ada"})));

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::EngineError);
    assert_eq!(err.macro_name.as_deref(), Some("shout"));
    assert!(err.line_number.is_some());
}

#[test]
fn macro_in_missing_template_is_template_not_found() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_macro("macros/absent.html", "card", &Context::new());
    assert_eq!(out.error_kind(), Some(RenderErrorKind::TemplateNotFound));
}

#[test]
fn caller_context_is_left_untouched() {
    let (_dir, dispatcher) = fixture();
    let context = ctx(json!({"name": "World", "tags": ["a", "b"]}));
    let snapshot = context.clone();

    dispatcher.render_template("greeting.html", &context);
    dispatcher.render_template("uses_missing.html", &context);
    dispatcher.render_object(&ada(), &context, None, None);

    assert_eq!(context, snapshot);
    assert!(!context.contains_key("debug_mode"));
    assert!(!context.contains_key("object"));
}

#[test]
fn render_object_uses_convention() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_object(&ada(), &Context::new(), None, None);
    assert_eq!(out.content, "Student Ada");
}

#[test]
fn render_object_uses_registered_variation() {
    let (_dir, mut dispatcher) = fixture();
    dispatcher
        .registry_mut()
        .register_template::<Student>(
            KeyRefinements::new().variation(Variation::of_enum(&Status::Active)),
            "student/active.html",
        )
        .unwrap();

    let variation = Variation::of_enum(&Status::Active);
    let out = dispatcher.render_object(&ada(), &Context::new(), None, Some(&variation));
    assert_eq!(out.content, "Active Ada (11)");
}

#[test]
fn render_object_merges_caller_context() {
    let (_dir, dispatcher) = fixture();
    let secondary = SecondaryType::of::<Enrollment>();
    let out = dispatcher.render_object(
        &ada(),
        &ctx(json!({"course": "Algebra"})),
        Some(&secondary),
        None,
    );
    assert_eq!(out.content, "Ada enrolled in Algebra");
}

#[test]
fn caller_supplied_object_binding_wins() {
    let (_dir, dispatcher) = fixture();
    let out = dispatcher.render_object(
        &ada(),
        &ctx(json!({"object": {"name": "Override"}})),
        None,
        None,
    );
    assert_eq!(out.content, "Student Override");
}

#[test]
fn render_object_with_macro_target() {
    let (_dir, mut dispatcher) = fixture();
    dispatcher
        .registry_mut()
        .register::<Student>(
            KeyRefinements::new().variation("card"),
            RenderTarget::macro_in("macros/student.html", "card"),
        )
        .unwrap();

    let variation = Variation::from("card");
    let out = dispatcher.render_object(&ada(), &Context::new(), None, Some(&variation));
    assert!(out.is_ok(), "{:?}", out.error);
    assert_eq!(out.content, "[Ada]");
}

#[test]
fn render_object_failure_is_data() {
    let (_dir, dispatcher) = fixture();
    let variation = Variation::from("graduated");
    let out = dispatcher.render_object(&ada(), &Context::new(), None, Some(&variation));

    assert_eq!(out.content, "");
    let err = out.error.unwrap();
    assert_eq!(err.kind, RenderErrorKind::TemplateNotFound);
    assert_eq!(err.template_name.as_deref(), Some("student/graduated.html"));
}

#[test]
fn debug_mode_reaches_templates() {
    let (_dir, mut dispatcher) = fixture();
    assert_eq!(dispatcher.render_template("debug.html", &Context::new()).content, "quiet");

    dispatcher.set_debug_mode(true);
    assert_eq!(dispatcher.render_template("debug.html", &Context::new()).content, "debug");

    let explicit = ctx(json!({"debug_mode": false}));
    assert_eq!(dispatcher.render_template("debug.html", &explicit).content, "quiet");
}

#[test]
fn debug_render_object_reports_resolution_and_outcome() {
    let (_dir, dispatcher) = fixture();
    let report = dispatcher.debug_render_object(&ada(), &ctx(json!({"x": 1})), None, None);

    assert!(report.render_success);
    assert_eq!(report.resolution.resolved, RenderTarget::template("student.html"));
    assert_eq!(report.content_length, "Student Ada".len());
    assert_eq!(report.context_keys, vec!["x".to_string()]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["resolution"]["source"]["tier"], "convention");
}
