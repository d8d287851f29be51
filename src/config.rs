//! Shove settings loaded from JSON

use crate::board::{ClearanceMatrix, ClearanceRule, NetNo};
use crate::planar::Tile;
use crate::shove::{Deadline, PadRequest, RecursionBudget};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoveSettings {
    pub max_recursion_depth: i32,
    pub max_via_recursion_depth: i32,
    /// Wall clock limit per top level operation; no limit when absent
    pub time_limit_ms: Option<u64>,
    pub check_only_front: bool,
    pub copper_sharing_allowed: bool,
    /// Number of clearance classes; class 0 never needs clearance
    pub clearance_classes: usize,
    pub clearance_rules: Vec<ClearanceRule>,
}

impl Default for ShoveSettings {
    fn default() -> Self {
        Self {
            max_recursion_depth: 20,
            max_via_recursion_depth: 5,
            time_limit_ms: None,
            check_only_front: true,
            copper_sharing_allowed: false,
            clearance_classes: 2,
            clearance_rules: Vec::new(),
        }
    }
}

impl ShoveSettings {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse shove settings")
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Budget for one top level operation; the deadline starts now
    pub fn budget(&self) -> RecursionBudget {
        let deadline = match self.time_limit_ms {
            Some(ms) => Deadline::after(Duration::from_millis(ms)),
            None => Deadline::NONE,
        };
        RecursionBudget::new(self.max_recursion_depth, self.max_via_recursion_depth, deadline)
    }

    pub fn clearance_matrix(&self, layer_count: usize) -> ClearanceMatrix {
        ClearanceMatrix::from_rules(self.clearance_classes, layer_count, &self.clearance_rules)
    }

    /// Pad request carrying the front-only and copper sharing flags
    pub fn pad_request(&self, shape: Tile, layer: usize, nets: &[NetNo], clearance_class: usize) -> PadRequest {
        PadRequest::new(shape, layer, nets, clearance_class)
            .with_check_only_front(self.check_only_front)
            .with_copper_sharing(self.copper_sharing_allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = ShoveSettings::from_json_str(r#"{ "max_via_recursion_depth": 1 }"#).unwrap();
        assert_eq!(settings.max_via_recursion_depth, 1);
        assert_eq!(settings.max_recursion_depth, 20);
        assert!(settings.check_only_front);
        assert_eq!(settings.time_limit_ms, None);
    }

    #[test]
    fn test_clearance_rules() {
        let settings = ShoveSettings::from_json_str(
            r#"{ "clearance_rules": [ { "class_a": 1, "class_b": 1, "value": 3 } ] }"#,
        )
        .unwrap();
        let matrix = settings.clearance_matrix(2);
        assert_eq!(matrix.value(1, 1, 1), 3);
        assert_eq!(matrix.value(0, 1, 0), 0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ShoveSettings::from_json_str("{ not json").is_err());
        assert!(ShoveSettings::from_json_file("/nonexistent/settings.json").is_err());
    }

    #[test]
    fn test_budget_from_settings() {
        let settings = ShoveSettings {
            max_recursion_depth: 2,
            max_via_recursion_depth: 1,
            ..ShoveSettings::default()
        };
        let budget = settings.budget();
        assert_eq!((budget.general, budget.via), (2, 1));
        assert!(!budget.expired());
    }
}
