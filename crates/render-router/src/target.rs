//! Render targets and registrations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::RegistrationKey;

/// Where a render operation goes: a whole template, or one macro inside a
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderTarget {
    #[serde(rename = "template")]
    TemplateRef { path: String },
    #[serde(rename = "macro")]
    MacroRef {
        template_path: String,
        macro_name: String,
    },
}

impl RenderTarget {
    pub fn template(path: impl Into<String>) -> Self {
        RenderTarget::TemplateRef { path: path.into() }
    }

    pub fn macro_in(template_path: impl Into<String>, macro_name: impl Into<String>) -> Self {
        RenderTarget::MacroRef {
            template_path: template_path.into(),
            macro_name: macro_name.into(),
        }
    }

    /// The template file this target lives in.
    pub fn template_path(&self) -> &str {
        match self {
            RenderTarget::TemplateRef { path } => path,
            RenderTarget::MacroRef { template_path, .. } => template_path,
        }
    }

    pub fn macro_name(&self) -> Option<&str> {
        match self {
            RenderTarget::TemplateRef { .. } => None,
            RenderTarget::MacroRef { macro_name, .. } => Some(macro_name),
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, RenderTarget::MacroRef { .. })
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::TemplateRef { path } => f.write_str(path),
            RenderTarget::MacroRef {
                template_path,
                macro_name,
            } => write!(f, "{}#{}", template_path, macro_name),
        }
    }
}

/// An entry of the registration table. Replaced wholesale on overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub key: RegistrationKey,
    pub target: RenderTarget,
}
