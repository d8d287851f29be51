//! Pairwise clearance rules between clearance classes

use serde::{Deserialize, Serialize};

/// Class 0 requires no clearance; used for best effort probes
pub const NO_CLEARANCE: usize = 0;

/// One rule of the clearance table; `layer: None` applies to every layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceRule {
    pub class_a: usize,
    pub class_b: usize,
    #[serde(default)]
    pub layer: Option<usize>,
    pub value: i64,
}

/// Symmetric minimum separation by (class, class, layer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceMatrix {
    class_count: usize,
    layer_count: usize,
    values: Vec<i64>,
}

impl ClearanceMatrix {
    pub fn new(class_count: usize, layer_count: usize) -> Self {
        let class_count = class_count.max(1);
        Self {
            class_count,
            layer_count,
            values: vec![0; class_count * class_count * layer_count],
        }
    }

    pub fn from_rules(class_count: usize, layer_count: usize, rules: &[ClearanceRule]) -> Self {
        let mut matrix = Self::new(class_count, layer_count);
        for rule in rules {
            match rule.layer {
                Some(layer) => matrix.set_value(rule.class_a, rule.class_b, layer, rule.value),
                None => matrix.set_default(rule.class_a, rule.class_b, rule.value),
            }
        }
        matrix
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    fn index(&self, a: usize, b: usize, layer: usize) -> Option<usize> {
        if a >= self.class_count || b >= self.class_count || layer >= self.layer_count {
            return None;
        }
        Some((layer * self.class_count + a) * self.class_count + b)
    }

    pub fn set_value(&mut self, a: usize, b: usize, layer: usize, value: i64) {
        if a == NO_CLEARANCE || b == NO_CLEARANCE {
            tracing::warn!(a, b, "clearance of class 0 is fixed to 0");
            return;
        }
        let value = value.max(0);
        if let (Some(ab), Some(ba)) = (self.index(a, b, layer), self.index(b, a, layer)) {
            self.values[ab] = value;
            self.values[ba] = value;
        }
    }

    /// Same value on all layers
    pub fn set_default(&mut self, a: usize, b: usize, value: i64) {
        for layer in 0..self.layer_count {
            self.set_value(a, b, layer, value);
        }
    }

    /// Required separation; unknown classes or layers need none
    pub fn value(&self, a: usize, b: usize, layer: usize) -> i64 {
        self.index(a, b, layer).map_or(0, |i| self.values[i])
    }

    /// Largest separation class `a` needs against any class on `layer`
    pub fn max_for_class(&self, a: usize, layer: usize) -> i64 {
        (0..self.class_count)
            .map(|b| self.value(a, b, layer))
            .max()
            .unwrap_or(0)
    }
}
