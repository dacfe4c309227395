//! Convention-based template naming.
//!
//! When neither an explicit registration nor a pattern resolver claims an
//! object, the registry falls back to a path derived from type names alone:
//!
//! | Primary | Secondary | Variation | Path |
//! |---------|-----------|-----------|------|
//! | `StudentRecord` | - | - | `student_record.html` |
//! | `StudentRecord` | `Enrollment` | - | `student_record/enrollment.html` |
//! | `StudentRecord` | `Enrollment` | `Completed` | `student_record/enrollment/completed.html` |
//!
//! Type identifiers are snake-cased; the variation is only lowercased, since
//! it is a value rather than a type name.

/// Default file extension appended to convention paths.
pub const DEFAULT_EXTENSION: &str = ".html";

/// Converts an upper-camel-case identifier to lower-snake-case.
///
/// An underscore is inserted before every uppercase character except the
/// first, then the whole identifier is lowercased. Runs of capitals are not
/// collapsed:
///
/// ```rust
/// use render_router::convention::to_snake_case;
///
/// assert_eq!(to_snake_case("StudentRecord"), "student_record");
/// assert_eq!(to_snake_case("HTTPServer"), "h_t_t_p_server");
/// assert_eq!(to_snake_case("school"), "school");
/// ```
pub fn to_snake_case(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 4);
    for (i, c) in identifier.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Builds default template paths from type and variation identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConvention {
    extension: String,
}

impl NameConvention {
    /// Creates a convention using the given file extension.
    ///
    /// A missing leading dot is added, so `"jinja"` and `".jinja"` are
    /// equivalent. An empty extension produces paths without a suffix.
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = if extension.is_empty() || extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };
        Self { extension }
    }

    /// The extension appended to every generated path.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns `primary[/secondary][/variation]` plus the extension.
    pub fn path(&self, primary: &str, secondary: Option<&str>, variation: Option<&str>) -> String {
        let mut parts = vec![to_snake_case(primary)];
        if let Some(secondary) = secondary.filter(|s| !s.is_empty()) {
            parts.push(to_snake_case(secondary));
        }
        if let Some(variation) = variation.filter(|v| !v.is_empty()) {
            parts.push(variation.to_lowercase());
        }
        format!("{}{}", parts.join("/"), self.extension)
    }
}

impl Default for NameConvention {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}
