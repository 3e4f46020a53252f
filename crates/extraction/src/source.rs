//! Source descriptors: where forecast and baseline fields live.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use vx_common::TimeCoords;

use crate::config::VxConfig;
use crate::error::TemplateError;
use crate::locator::{Locator, LocatorTemplate};

/// Which side of the comparison a source provides.
///
/// Declaration order is the canonical job order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Forecast,
    Baseline,
}

impl SourceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceRole::Forecast => "forecast",
            SourceRole::Baseline => "baseline",
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
}

/// An immutable description of one source store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub role: SourceRole,
    /// Display label
    pub name: String,
    pub template: LocatorTemplate,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    /// Build a descriptor, compiling its template. The kind follows the
    /// template's scheme.
    pub fn new(role: SourceRole, name: &str, template: &str) -> Result<Self, TemplateError> {
        let template = LocatorTemplate::parse(template)?;
        let kind = if template.is_remote() {
            SourceKind::Remote
        } else {
            SourceKind::Local
        };

        Ok(Self {
            role,
            name: name.to_string(),
            template,
            kind,
        })
    }

    /// Both sources named by a configuration, in canonical order.
    pub fn from_config(config: &VxConfig) -> Result<Vec<Self>, TemplateError> {
        Ok(vec![
            Self::new(
                SourceRole::Forecast,
                &config.forecast.name,
                &config.forecast.path,
            )?,
            Self::new(
                SourceRole::Baseline,
                &config.baseline.name,
                &config.baseline.template,
            )?,
        ])
    }

    /// Resolve the location holding `variable` at `time`.
    pub fn locate(&self, time: &TimeCoords, variable: &str) -> Locator {
        let rendered = self.template.render(time, variable);
        match self.kind {
            SourceKind::Local => Locator::Path(PathBuf::from(rendered)),
            SourceKind::Remote => Locator::Url(rendered),
        }
    }
}
