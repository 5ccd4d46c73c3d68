//! Rebalancing of populations in which every class is known.

use serde::Serialize;

use crate::error::RebalancingError;
use crate::item::{RebalancedItem, sort_by_volume};

/// Result of [`adjust_sample_rates_full`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRebalance<T> {
    /// All classes with their new sample rate, smallest class first.
    pub classes: Vec<RebalancedItem<T>>,
    /// The number of events kept across all classes at their new sample rates.
    pub used_budget: f64,
}

/// Computes an individual sample rate for every class.
///
/// The budget of `sum(count) * rate` kept events is spread across the classes such that each of
/// them keeps roughly the same number of events. `intensity` blends between sampling every class
/// at `rate` (`0.0`) and the fully flattened distribution (`1.0`). Classes that would need a rate
/// above `1.0` are sampled fully and the remaining classes absorb their share of the budget.
///
/// If `min_budget` is given, the ideal per-class volume is raised whenever the remaining classes
/// could otherwise not spend at least that budget. It defaults to `sum(count) * rate`.
///
/// The input is not modified. Classes are returned in processing order, which is ascending by
/// `(count, id)`.
///
/// # Example
///
/// ```
/// use relay_rebalancing::{RebalancedItem, adjust_sample_rates_full};
///
/// let classes = [RebalancedItem::new("a", 100.0), RebalancedItem::new("b", 10.0)];
/// let rebalance = adjust_sample_rates_full(&classes, 0.5, 1.0, None).unwrap();
///
/// assert_eq!(rebalance.classes[0].id, "b");
/// assert_eq!(rebalance.classes[0].new_sample_rate, 1.0);
/// assert_eq!(rebalance.classes[1].new_sample_rate, 0.45);
/// ```
pub fn adjust_sample_rates_full<T>(
    classes: &[RebalancedItem<T>],
    rate: f64,
    intensity: f64,
    min_budget: Option<f64>,
) -> Result<FullRebalance<T>, RebalancingError>
where
    T: Ord + Clone,
{
    let sorted = sort_by_volume(classes);
    rebalance_sorted(&sorted, rate, intensity, min_budget)
}

/// Rebalances classes that are already sorted descending by `(count, id)`.
pub(crate) fn rebalance_sorted<T>(
    classes: &[&RebalancedItem<T>],
    rate: f64,
    intensity: f64,
    min_budget: Option<f64>,
) -> Result<FullRebalance<T>, RebalancingError>
where
    T: Clone,
{
    let total = classes.iter().fold(0.0, |total, item| total + item.count);
    let mut min_budget = min_budget.unwrap_or(total * rate);

    if total < min_budget {
        return Err(RebalancingError::InsufficientVolume { total, min_budget });
    }

    let mut num_classes = classes.len();
    let mut used_budget = 0.0;
    let mut result = Vec::with_capacity(num_classes);

    if num_classes == 0 {
        return Ok(FullRebalance {
            classes: result,
            used_budget,
        });
    }

    let mut ideal = total * rate / num_classes as f64;

    for item in classes.iter().rev() {
        let count = item.count;

        // The remaining classes could not reach the minimum budget at the current ideal.
        if ideal * (num_classes as f64) < min_budget {
            ideal = min_budget / num_classes as f64;
        }

        let sampled = count * rate;
        let delta = ideal - sampled;
        let correction = delta * intensity;
        let desired_count = sampled + correction;

        let (new_sample_rate, used) = if desired_count > count {
            (1.0, count)
        } else if count > 0.0 {
            (desired_count / count, desired_count)
        } else {
            (0.0, 0.0)
        };

        relay_log::trace!(
            count,
            ideal,
            desired_count,
            new_sample_rate,
            "rebalanced class"
        );

        result.push(item.with_sample_rate(new_sample_rate));
        min_budget -= used;
        used_budget += used;
        num_classes -= 1;
    }

    Ok(FullRebalance {
        classes: result,
        used_budget,
    })
}
