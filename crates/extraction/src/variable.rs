//! Variable specifications built from the configuration's variable table.

use vx_common::{FieldSelector, Level, LevelType};

use crate::config::VariableConfig;

/// One variable to verify.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Internal key, e.g. "HGT"
    pub name: String,
    pub level_type: LevelType,
    /// Ascending, deduplicated; empty for single-level variables
    pub levels: Vec<Level>,
    /// Short name identifying the field in the source, e.g. "gh"
    pub standard_name: String,
}

impl VariableSpec {
    pub fn new(
        name: &str,
        level_type: LevelType,
        levels: impl IntoIterator<Item = Level>,
        standard_name: &str,
    ) -> Self {
        let mut levels: Vec<Level> = levels.into_iter().collect();
        levels.sort();
        levels.dedup();

        Self {
            name: name.to_string(),
            level_type,
            levels,
            standard_name: standard_name.to_string(),
        }
    }

    pub fn from_config(name: &str, config: &VariableConfig) -> Self {
        Self::new(
            name,
            config.level_type,
            config.levels.iter().copied(),
            &config.standard_name,
        )
    }

    pub fn is_single_level(&self) -> bool {
        self.level_type.is_single_level()
    }

    /// The level slots this variable occupies: its levels, or a single
    /// `None` entry for single-level variables.
    pub fn level_slots(&self) -> Vec<Option<Level>> {
        if self.is_single_level() || self.levels.is_empty() {
            vec![None]
        } else {
            self.levels.iter().copied().map(Some).collect()
        }
    }

    /// Selector for the field at `level`.
    pub fn selector(&self, level: Option<Level>) -> FieldSelector {
        FieldSelector {
            short_name: self.standard_name.clone(),
            level_type: self.level_type,
            level,
        }
    }
}
