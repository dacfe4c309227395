//! Registration keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::{SecondaryType, Variation};

/// Normalized lookup key: primary type, optional secondary type, optional
/// variation value.
///
/// Keys compare by value. Empty secondary or variation strings are treated as
/// absent, so `("School", Some(""), None)` and `("School", None, None)` are the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub primary: String,
    pub secondary: Option<String>,
    pub variation: Option<String>,
}

impl RegistrationKey {
    pub fn new(
        primary: impl Into<String>,
        secondary: Option<impl Into<String>>,
        variation: Option<impl Into<String>>,
    ) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.map(Into::into).filter(|s: &String| !s.is_empty()),
            variation: variation.map(Into::into).filter(|s: &String| !s.is_empty()),
        }
    }

    /// Key with only a primary identifier.
    pub fn bare(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
            variation: None,
        }
    }

    /// Builds the key for a primary type name refined by `refinements`.
    pub fn refined(primary: impl Into<String>, refinements: &KeyRefinements) -> Self {
        Self::new(
            primary,
            refinements.secondary.as_ref().map(|s| s.name().to_string()),
            refinements
                .variation
                .as_ref()
                .map(|v| v.normalized().to_string()),
        )
    }

    /// The four lookup candidates, most specific first.
    ///
    /// Secondary specificity is checked before variation specificity:
    /// `(p, s, v)`, `(p, s, -)`, `(p, -, v)`, `(p, -, -)`. Candidates that
    /// collapse to the same key because a refinement is absent appear once.
    pub fn candidates(&self) -> Vec<RegistrationKey> {
        let tiers = [
            (self.secondary.clone(), self.variation.clone()),
            (self.secondary.clone(), None),
            (None, self.variation.clone()),
            (None, None),
        ];
        let mut out: Vec<RegistrationKey> = Vec::with_capacity(tiers.len());
        for (secondary, variation) in tiers {
            let key = RegistrationKey {
                primary: self.primary.clone(),
                secondary,
                variation,
            };
            if !out.contains(&key) {
                out.push(key);
            }
        }
        out
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)?;
        if let Some(secondary) = &self.secondary {
            write!(f, ":{}", secondary)?;
        }
        if let Some(variation) = &self.variation {
            write!(f, ":{}", variation)?;
        }
        Ok(())
    }
}

/// Optional refinements of a registration beyond the primary type.
///
/// ```rust
/// use render_router::{KeyRefinements, SecondaryType};
///
/// struct Enrollment;
///
/// let refinements = KeyRefinements::new()
///     .secondary::<Enrollment>()
///     .variation("completed");
/// assert_eq!(refinements.secondary_type(), Some(&SecondaryType::named("Enrollment")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRefinements {
    secondary: Option<SecondaryType>,
    variation: Option<Variation>,
}

impl KeyRefinements {
    /// No refinements: the bare primary key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refines by the secondary type `T`.
    pub fn secondary<T: ?Sized>(self) -> Self {
        self.with_secondary(SecondaryType::of::<T>())
    }

    /// Refines by an explicit secondary classifier.
    pub fn with_secondary(mut self, secondary: SecondaryType) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Refines by a variation (enum value or plain string).
    pub fn variation(mut self, variation: impl Into<Variation>) -> Self {
        self.variation = Some(variation.into());
        self
    }

    pub fn secondary_type(&self) -> Option<&SecondaryType> {
        self.secondary.as_ref()
    }

    pub fn variation_value(&self) -> Option<&Variation> {
        self.variation.as_ref()
    }
}

impl From<Variation> for KeyRefinements {
    fn from(variation: Variation) -> Self {
        KeyRefinements::new().variation(variation)
    }
}

impl From<SecondaryType> for KeyRefinements {
    fn from(secondary: SecondaryType) -> Self {
        KeyRefinements::new().with_secondary(secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_present_parts() {
        assert_eq!(RegistrationKey::bare("School").to_string(), "School");
        let key = RegistrationKey::new("Student", None::<String>, Some("active"));
        assert_eq!(key.to_string(), "Student:active");
        let key = RegistrationKey::new("Student", Some("Course"), Some("active"));
        assert_eq!(key.to_string(), "Student:Course:active");
    }

    #[test]
    fn test_empty_refinements_are_absent() {
        let key = RegistrationKey::new("School", Some(""), Some(""));
        assert_eq!(key, RegistrationKey::bare("School"));
    }

    #[test]
    fn test_candidate_order() {
        let key = RegistrationKey::new("Student", Some("Course"), Some("active"));
        let rendered: Vec<String> = key.candidates().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Student:Course:active",
                "Student:Course",
                "Student:active",
                "Student",
            ]
        );
    }

    #[test]
    fn test_candidates_collapse_without_refinements() {
        let key = RegistrationKey::bare("School");
        assert_eq!(key.candidates(), vec![RegistrationKey::bare("School")]);
    }

    #[test]
    fn test_candidates_with_variation_only() {
        let key = RegistrationKey::new("Student", None::<String>, Some("active"));
        let rendered: Vec<String> = key.candidates().iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["Student:active", "Student"]);
    }

    #[test]
    fn test_refined_normalizes_variation() {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "lowercase")]
        enum Status {
            Active,
        }

        let refinements = KeyRefinements::new().variation(Variation::of_enum(&Status::Active));
        let key = RegistrationKey::refined("Student", &refinements);
        assert_eq!(key.variation.as_deref(), Some("active"));
    }
}
