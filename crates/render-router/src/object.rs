//! Runtime objects and the refinements used to classify them.
//!
//! The registry dispatches on three axes:
//!
//! - the object's own type ([`Renderable::type_name`]),
//! - an optional [`SecondaryType`] (e.g. the model a view belongs to),
//! - an optional [`Variation`] (e.g. a status value).
//!
//! Any `Serialize + 'static` type is [`Renderable`] through a blanket impl, so
//! plain data structs can be passed straight to the registry and then injected
//! into template contexts.

use std::any::Any;
use std::fmt;

use serde::Serialize;

/// Strips module path and generic arguments from a fully qualified type name.
///
/// ```rust
/// use render_router::object::short_type_name;
///
/// assert_eq!(short_type_name("app::models::StudentRecord"), "StudentRecord");
/// assert_eq!(short_type_name("alloc::vec::Vec<app::Course>"), "Vec");
/// assert_eq!(short_type_name("School"), "School");
/// ```
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Short type name of `T`, as used for registration keys.
pub fn type_name_of<T: ?Sized>() -> &'static str {
    short_type_name(std::any::type_name::<T>())
}

/// An object that can be resolved to a template and rendered.
///
/// Implemented for every `T: Serialize + 'static`; there is no need to
/// implement it by hand.
pub trait Renderable: Any {
    /// The short type name used as the primary registration identifier.
    fn type_name(&self) -> &'static str;

    /// Access to the concrete value, for downcasting in pattern resolvers.
    fn as_any(&self) -> &dyn Any;

    /// Serializes the object for injection into a template context.
    fn to_context_value(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T: Serialize + Any> Renderable for T {
    fn type_name(&self) -> &'static str {
        type_name_of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_context_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Debug for dyn Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Renderable({})", self.type_name())
    }
}

/// A secondary classifier, identified by type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecondaryType {
    name: String,
}

impl SecondaryType {
    /// Classifier named after the Rust type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: type_name_of::<T>().to_string(),
        }
    }

    /// Classifier with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SecondaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A variation tag, either an enumerated value or a plain string.
///
/// Both forms normalize to a single string through [`Variation::normalized`].
/// For enum values that is the *value* (`"active"`), never the enum's type
/// name (`"EnrollmentStatus"`), so registering with `Status::Active` and
/// looking up with `"active"` reach the same registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variation {
    /// An enumerated value, remembered with the enum's type name for
    /// diagnostics.
    Enum { type_name: String, value: String },
    /// A free-form string.
    Plain(String),
}

impl Variation {
    /// Builds an enum variation from any serializable value.
    ///
    /// Unit variants serialize to their (possibly renamed) string form; numbers
    /// and booleans are stringified. Other shapes fall back to their compact
    /// JSON text. A value that fails to serialize, or serializes to `null`,
    /// yields an empty variation, which lookups treat as absent; a warning is
    /// logged.
    ///
    /// ```rust
    /// use render_router::Variation;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// #[serde(rename_all = "lowercase")]
    /// enum Status { Active, Archived }
    ///
    /// let v = Variation::of_enum(&Status::Active);
    /// assert_eq!(v.normalized(), "active");
    /// assert_eq!(v, Variation::of_enum(&Status::Active));
    /// assert_ne!(v.normalized(), "Status");
    /// # let _ = Status::Archived;
    /// ```
    pub fn of_enum<E: Serialize + ?Sized>(value: &E) -> Self {
        let type_name = type_name_of::<E>();
        let value = match serde_json::to_value(value) {
            Ok(serde_json::Value::String(s)) => s,
            Ok(serde_json::Value::Null) => {
                tracing::warn!(type_name, "variation serialized to null; treating as absent");
                String::new()
            }
            Err(err) => {
                tracing::warn!(
                    type_name,
                    error = %err,
                    "variation failed to serialize; treating as absent",
                );
                String::new()
            }
            Ok(other) => other.to_string(),
        };
        Variation::Enum {
            type_name: type_name.to_string(),
            value,
        }
    }

    /// The canonical string used in registration keys and convention paths.
    pub fn normalized(&self) -> &str {
        match self {
            Variation::Enum { value, .. } => value,
            Variation::Plain(s) => s,
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variation::Enum { type_name, value } => write!(f, "{}({})", type_name, value),
            Variation::Plain(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Variation {
    fn from(s: &str) -> Self {
        Variation::Plain(s.to_string())
    }
}

impl From<String> for Variation {
    fn from(s: String) -> Self {
        Variation::Plain(s)
    }
}
