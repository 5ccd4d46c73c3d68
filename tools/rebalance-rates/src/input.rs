use std::fmt;

use relay_rebalancing::{FullRebalancingInput, RebalancedItem, RebalancingConfig, RebalancingInput};
use serde::{Deserialize, Serialize};

use crate::config::OverridableConfig;

/// Identifier of a class, either a numeric project id or a name such as a transaction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ClassId {
    /// A numeric identifier, such as a project id.
    Int(u64),
    /// A named identifier, such as a transaction name.
    Str(String),
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => write!(f, "{id}"),
        }
    }
}

/// The input document read by the tool.
///
/// Knobs that are missing from the document fall back to the configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDocument {
    /// The explicitly listed classes.
    pub classes: Vec<RebalancedItem<ClassId>>,
    /// The sample rate to achieve across the population.
    #[serde(default)]
    pub sample_rate: Option<f64>,
    /// How far sample rates are pulled towards an even distribution.
    #[serde(default)]
    pub intensity: Option<f64>,
    /// The number of classes in the population, including implicit ones.
    #[serde(default)]
    pub total_num_classes: Option<usize>,
    /// The number of events in the population, including implicit classes.
    #[serde(default)]
    pub total: Option<f64>,
    /// The minimum budget for full rebalancing.
    #[serde(default)]
    pub min_budget: Option<f64>,
}

impl InputDocument {
    /// Resolves the knobs for this document.
    ///
    /// Command line overrides win over the document, which wins over the configuration.
    pub fn knobs(
        &self,
        config: &RebalancingConfig,
        overrides: &OverridableConfig,
    ) -> RebalancingConfig {
        RebalancingConfig {
            sample_rate: overrides
                .sample_rate
                .or(self.sample_rate)
                .unwrap_or(config.sample_rate),
            intensity: overrides
                .intensity
                .or(self.intensity)
                .unwrap_or(config.intensity),
        }
    }

    /// Converts this document into an input for partial rebalancing.
    pub fn into_input(self, knobs: &RebalancingConfig) -> RebalancingInput<ClassId> {
        knobs.input(self.classes, self.total_num_classes, self.total)
    }

    /// Converts this document into an input for full rebalancing.
    ///
    /// Implicit classes are not supported by full rebalancing and are ignored.
    pub fn into_full_input(self, knobs: &RebalancingConfig) -> FullRebalancingInput<ClassId> {
        knobs.full_input(self.classes, self.min_budget)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_mixed_ids() {
        let document: InputDocument = serde_json::from_str(
            r#"{"classes": [{"id": 42, "count": 10.0}, {"id": "/checkout", "count": 2.0}]}"#,
        )
        .unwrap();

        let ids: Vec<_> = document.classes.iter().map(|item| &item.id).collect();
        assert_eq!(
            ids,
            vec![&ClassId::Int(42), &ClassId::Str("/checkout".to_owned())]
        );
        assert_eq!(ids[1].to_string(), "/checkout");
    }

    #[test]
    fn test_knob_precedence() {
        let document: InputDocument =
            serde_json::from_str(r#"{"classes": [], "sampleRate": 0.3}"#).unwrap();

        let config = RebalancingConfig {
            sample_rate: 0.1,
            intensity: 0.7,
        };

        let knobs = document.knobs(&config, &OverridableConfig::default());
        assert_eq!(knobs.sample_rate, 0.3);
        assert_eq!(knobs.intensity, 0.7);

        let overrides = OverridableConfig {
            sample_rate: Some(0.5),
            ..Default::default()
        };
        let knobs = document.knobs(&config, &overrides);
        assert_eq!(knobs.sample_rate, 0.5);
    }
}
