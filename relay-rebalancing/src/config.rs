//! Validated inputs for rebalancing runs.

use serde::{Deserialize, Serialize};

use crate::error::RebalancingError;
use crate::full::{FullRebalance, adjust_sample_rates_full};
use crate::item::{RebalancedItem, sum_counts};
use crate::rebalance::{RebalancedRates, adjust_sample_rates};

/// Policy knobs for rebalancing, usually set per organization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RebalancingConfig {
    /// The sample rate to achieve across the entire population.
    pub sample_rate: f64,
    /// How far sample rates are pulled towards an even distribution of kept events.
    pub intensity: f64,
}

impl RebalancingConfig {
    /// Checks that both the sample rate and the intensity are within `[0, 1]`.
    pub fn validate(&self) -> Result<(), RebalancingError> {
        validate_unit(self.sample_rate, "sample rate must be within [0, 1]")?;
        validate_unit(self.intensity, "intensity must be within [0, 1]")
    }

    /// Creates the input for rebalancing a partially known population with this configuration.
    pub fn input<T>(
        &self,
        classes: Vec<RebalancedItem<T>>,
        total_num_classes: Option<usize>,
        total: Option<f64>,
    ) -> RebalancingInput<T> {
        RebalancingInput {
            classes,
            sample_rate: self.sample_rate,
            total_num_classes,
            total,
            intensity: self.intensity,
        }
    }

    /// Creates the input for rebalancing a fully known population with this configuration.
    pub fn full_input<T>(
        &self,
        classes: Vec<RebalancedItem<T>>,
        min_budget: Option<f64>,
    ) -> FullRebalancingInput<T> {
        FullRebalancingInput {
            classes,
            sample_rate: self.sample_rate,
            intensity: self.intensity,
            min_budget,
        }
    }
}

impl Default for RebalancingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            intensity: 1.0,
        }
    }
}

/// Input for [`adjust_sample_rates`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingInput<T> {
    /// The classes that receive an individual sample rate.
    pub classes: Vec<RebalancedItem<T>>,
    /// The sample rate to achieve across the entire population.
    pub sample_rate: f64,
    /// The number of classes in the population, including implicit ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_num_classes: Option<usize>,
    /// The number of events in the population, including implicit classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// How far sample rates are pulled towards an even distribution of kept events.
    pub intensity: f64,
}

impl<T> RebalancingInput<T> {
    /// Checks the input for consistency.
    ///
    /// Rates must be within `[0, 1]`, counts must be finite and non-negative, and the population
    /// totals must cover the explicit classes. The list of classes may be empty if the population
    /// consists of implicit classes only.
    pub fn validate(&self) -> Result<(), RebalancingError> {
        validate_unit(self.sample_rate, "sample rate must be within [0, 1]")?;
        validate_unit(self.intensity, "intensity must be within [0, 1]")?;

        validate_counts(&self.classes)?;

        if self
            .total_num_classes
            .is_some_and(|total_num_classes| total_num_classes < self.classes.len())
        {
            return Err(RebalancingError::InvalidInput(
                "total number of classes is smaller than the number of explicit classes",
            ));
        }

        if let Some(total) = self.total {
            if total.is_nan() || total < sum_counts(&self.classes) {
                return Err(RebalancingError::InvalidInput(
                    "total volume is smaller than the volume of explicit classes",
                ));
            }
        }

        Ok(())
    }

    /// Validates the input and computes the rebalanced sample rates.
    pub fn run(&self) -> Result<RebalancedRates<T>, RebalancingError>
    where
        T: Ord + Clone,
    {
        self.validate()?;
        adjust_sample_rates(
            &self.classes,
            self.sample_rate,
            self.total_num_classes,
            self.total,
            self.intensity,
        )
    }
}

/// Input for [`adjust_sample_rates_full`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRebalancingInput<T> {
    /// All classes of the population.
    pub classes: Vec<RebalancedItem<T>>,
    /// The sample rate to achieve across all classes.
    pub sample_rate: f64,
    /// How far sample rates are pulled towards an even distribution of kept events.
    pub intensity: f64,
    /// The minimum number of events to keep across all classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_budget: Option<f64>,
}

impl<T> FullRebalancingInput<T> {
    /// Checks that rates are within `[0, 1]` and counts are finite and non-negative.
    pub fn validate(&self) -> Result<(), RebalancingError> {
        validate_unit(self.sample_rate, "sample rate must be within [0, 1]")?;
        validate_unit(self.intensity, "intensity must be within [0, 1]")?;
        validate_counts(&self.classes)
    }

    /// Validates the input and computes the rebalanced sample rates.
    pub fn run(&self) -> Result<FullRebalance<T>, RebalancingError>
    where
        T: Ord + Clone,
    {
        self.validate()?;
        adjust_sample_rates_full(
            &self.classes,
            self.sample_rate,
            self.intensity,
            self.min_budget,
        )
    }
}

fn validate_unit(value: f64, message: &'static str) -> Result<(), RebalancingError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RebalancingError::InvalidInput(message))
    }
}

fn validate_counts<T>(classes: &[RebalancedItem<T>]) -> Result<(), RebalancingError> {
    let valid = classes
        .iter()
        .all(|item| item.count.is_finite() && item.count >= 0.0);

    if valid {
        Ok(())
    } else {
        Err(RebalancingError::InvalidInput(
            "class counts must be finite and non-negative",
        ))
    }
}
