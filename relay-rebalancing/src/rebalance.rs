//! Rebalancing of populations that contain classes known only in aggregate.

use serde::Serialize;

use crate::error::RebalancingError;
use crate::full::{FullRebalance, rebalance_sorted};
use crate::item::{RebalancedItem, sort_by_volume, sum_counts};

/// Result of [`adjust_sample_rates`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancedRates<T> {
    /// The explicitly listed classes with their new sample rate, smallest class first.
    pub classes: Vec<RebalancedItem<T>>,
    /// The sample rate shared by all classes that were not listed explicitly.
    pub implicit_rate: f64,
}

impl<T> RebalancedRates<T> {
    /// Returns the sample rate to apply to the class with the given identifier.
    ///
    /// Classes that were not listed explicitly are sampled at [`Self::implicit_rate`].
    pub fn sample_rate(&self, id: &T) -> f64
    where
        T: PartialEq,
    {
        self.classes
            .iter()
            .find(|item| &item.id == id)
            .map_or(self.implicit_rate, |item| item.new_sample_rate)
    }

    /// Returns the expected number of kept events, given the volume of the implicit classes.
    pub fn kept_volume(&self, total_implicit: f64) -> f64 {
        let explicit = self
            .classes
            .iter()
            .fold(0.0, |kept, item| kept + item.kept_count());

        explicit + total_implicit * self.implicit_rate
    }
}

/// Computes sample rates for the explicit classes and a shared rate for all other classes.
///
/// The population consists of `total_num_classes` classes with a combined volume of `total`
/// events, of which only `classes` are listed individually. Both default to the explicit classes,
/// in which case every class is rebalanced with
/// [`adjust_sample_rates_full`](crate::adjust_sample_rates_full).
///
/// The budget of `total * rate` kept events is split evenly per class between the explicit and
/// the implicit population. If one population cannot spend its share, it is sampled fully and the
/// other population receives the rest. The explicit classes are then flattened according to
/// `intensity`, and the implicit classes receive whatever budget the explicit ones left over.
///
/// # Errors
///
/// - [`RebalancingError::NoClasses`] if the population is empty.
/// - [`RebalancingError::NoImplicitVolume`] if implicit classes require a rate but have no volume.
/// - [`RebalancingError::InsufficientVolume`] if the explicit classes cannot spend their minimum
///   budget, which indicates that `total` is inconsistent with the class counts.
pub fn adjust_sample_rates<T>(
    classes: &[RebalancedItem<T>],
    rate: f64,
    total_num_classes: Option<usize>,
    total: Option<f64>,
    intensity: f64,
) -> Result<RebalancedRates<T>, RebalancingError>
where
    T: Ord + Clone,
{
    let sorted = sort_by_volume(classes);

    let total_explicit = sum_counts(classes);
    let total = total.unwrap_or(total_explicit);
    let total_num_classes = total_num_classes.unwrap_or(classes.len());

    if total_num_classes == 0 {
        return Err(RebalancingError::NoClasses);
    }

    let total_implicit = total - total_explicit;
    let num_explicit_classes = classes.len();
    let num_implicit_classes = total_num_classes as f64 - num_explicit_classes as f64;

    let total_budget = total * rate;
    let budget_per_class = total_budget / total_num_classes as f64;
    let implicit_budget = budget_per_class * num_implicit_classes;
    let explicit_budget = budget_per_class * num_explicit_classes as f64;

    relay_log::debug!(
        total,
        total_explicit,
        total_implicit,
        total_budget,
        num_explicit_classes,
        total_num_classes,
        "rebalancing sample rates"
    );

    if num_explicit_classes == total_num_classes {
        relay_log::debug!("all classes are explicit");
        let rebalance = rebalance_sorted(&sorted, rate, intensity, None)?;

        return Ok(RebalancedRates {
            classes: rebalance.classes,
            implicit_rate: rate,
        });
    }

    if total_implicit < implicit_budget {
        // The implicit classes are sampled fully, the explicit ones spend the rest.
        relay_log::debug!(implicit_budget, "implicit classes cannot spend their budget");
        let explicit_budget = total_budget - total_implicit;
        let rebalance =
            rebalance_explicit(&sorted, explicit_budget, total_explicit, intensity, None)?;

        return Ok(RebalancedRates {
            classes: rebalance.classes,
            implicit_rate: 1.0,
        });
    }

    if total_explicit < explicit_budget {
        relay_log::debug!(explicit_budget, "explicit classes cannot spend their budget");
        let classes = sorted
            .iter()
            .rev()
            .map(|item| item.with_sample_rate(1.0))
            .collect();

        let implicit_budget = total_budget - total_explicit;
        return Ok(RebalancedRates {
            classes,
            implicit_rate: implicit_rate(implicit_budget, total_implicit)?,
        });
    }

    // The explicit classes must spend at least what the implicit classes cannot absorb, but never
    // more than their own volume.
    let minimum_explicit_budget = (total_budget - total_implicit).min(total_explicit);
    let rebalance = rebalance_explicit(
        &sorted,
        explicit_budget,
        total_explicit,
        intensity,
        Some(minimum_explicit_budget),
    )?;

    let implicit_budget = total_budget - rebalance.used_budget;
    relay_log::debug!(
        used_budget = rebalance.used_budget,
        implicit_budget,
        "explicit classes rebalanced"
    );

    Ok(RebalancedRates {
        classes: rebalance.classes,
        implicit_rate: implicit_rate(implicit_budget, total_implicit)?,
    })
}

/// Rebalances the explicit classes so they spend `explicit_budget` events in total.
///
/// If the explicit classes have no volume, all of them are assigned a sample rate of `0.0`.
fn rebalance_explicit<T>(
    sorted: &[&RebalancedItem<T>],
    explicit_budget: f64,
    total_explicit: f64,
    intensity: f64,
    min_budget: Option<f64>,
) -> Result<FullRebalance<T>, RebalancingError>
where
    T: Clone,
{
    if total_explicit <= 0.0 {
        return Ok(FullRebalance {
            classes: sorted
                .iter()
                .rev()
                .map(|item| item.with_sample_rate(0.0))
                .collect(),
            used_budget: 0.0,
        });
    }

    let explicit_rate = explicit_budget / total_explicit;
    rebalance_sorted(sorted, explicit_rate, intensity, min_budget)
}

fn implicit_rate(implicit_budget: f64, total_implicit: f64) -> Result<f64, RebalancingError> {
    if total_implicit <= 0.0 {
        return Err(RebalancingError::NoImplicitVolume);
    }

    // Rounding may push the rate marginally outside of the unit interval.
    Ok((implicit_budget / total_implicit).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use crate::tests::assert_close;

    use super::*;

    fn items(counts: &[(&'static str, f64)]) -> Vec<RebalancedItem<&'static str>> {
        counts
            .iter()
            .map(|&(id, count)| RebalancedItem::new(id, count))
            .collect()
    }

    /// Asserts that the rebalanced rates keep as many events as the flat rate would.
    fn assert_conserved(
        rates: &RebalancedRates<&str>,
        classes: &[RebalancedItem<&str>],
        total: f64,
        rate: f64,
    ) {
        let total_implicit = total - sum_counts(classes);
        assert_close(rates.kept_volume(total_implicit), total * rate);
    }

    fn assert_bounded(rates: &RebalancedRates<&str>) {
        for item in &rates.classes {
            assert!((0.0..=1.0).contains(&item.new_sample_rate), "{item:?}");
        }
        assert!((0.0..=1.0).contains(&rates.implicit_rate));
    }

    #[test]
    fn test_single_class_at_full_rate() {
        relay_log::init_test!();

        let classes = items(&[("tb1", 1000.0)]);
        let rates = adjust_sample_rates(&classes, 1.0, Some(1), None, 1.0).unwrap();

        assert_eq!(rates.classes, vec![RebalancedItem {
            id: "tb1",
            count: 1000.0,
            new_sample_rate: 1.0,
        }]);
        assert_eq!(rates.implicit_rate, 1.0);
    }

    #[test]
    fn test_all_explicit() {
        let classes = items(&[("a", 100.0), ("b", 10.0)]);
        let rates = adjust_sample_rates(&classes, 0.5, Some(2), None, 1.0).unwrap();

        assert_close(rates.sample_rate(&"a"), 0.45);
        assert_close(rates.sample_rate(&"b"), 1.0);
        assert_eq!(rates.implicit_rate, 0.5);
        assert_conserved(&rates, &classes, 110.0, 0.5);
    }

    #[test]
    fn test_defaults_to_explicit_population() {
        let classes = items(&[("a", 100.0), ("b", 10.0)]);

        let defaulted = adjust_sample_rates(&classes, 0.5, None, None, 1.0).unwrap();
        let explicit = adjust_sample_rates(&classes, 0.5, Some(2), Some(110.0), 1.0).unwrap();

        assert_eq!(defaulted, explicit);
    }

    #[test]
    fn test_zero_intensity_is_noop() {
        let classes = items(&[("a", 1000.0), ("b", 300.0), ("c", 20.0), ("d", 5.0)]);
        let rates = adjust_sample_rates(&classes, 0.1, None, None, 0.0).unwrap();

        assert_eq!(rates.classes.len(), classes.len());
        for item in &classes {
            assert_close(rates.sample_rate(&item.id), 0.1);
        }
    }

    #[test]
    fn test_implicit_classes_saturate() {
        // Two implicit classes with 10 events cannot spend their budget of 40 events.
        let classes = items(&[("a", 100.0), ("b", 50.0)]);
        let rates = adjust_sample_rates(&classes, 0.5, Some(4), Some(160.0), 1.0).unwrap();

        assert_eq!(rates.implicit_rate, 1.0);
        assert_close(rates.sample_rate(&"a"), 0.35);
        assert_close(rates.sample_rate(&"b"), 0.7);
        assert_conserved(&rates, &classes, 160.0, 0.5);
        assert_bounded(&rates);
    }

    #[test]
    fn test_explicit_classes_saturate() {
        let classes = items(&[("a", 10.0), ("b", 5.0)]);
        let rates = adjust_sample_rates(&classes, 0.1, Some(4), Some(1015.0), 1.0).unwrap();

        assert_eq!(rates.sample_rate(&"a"), 1.0);
        assert_eq!(rates.sample_rate(&"b"), 1.0);
        assert_close(rates.implicit_rate, 0.0865);
        assert_conserved(&rates, &classes, 1015.0, 0.1);
        assert_bounded(&rates);
    }

    #[test]
    fn test_balanced_population() {
        let classes = items(&[("a", 100.0), ("b", 20.0)]);
        let rates = adjust_sample_rates(&classes, 0.5, Some(4), Some(200.0), 1.0).unwrap();

        assert_close(rates.sample_rate(&"a"), 0.25);
        assert_close(rates.sample_rate(&"b"), 1.0);
        assert_close(rates.implicit_rate, 0.6875);
        assert_conserved(&rates, &classes, 200.0, 0.5);
        assert_bounded(&rates);
    }

    #[test]
    fn test_balanced_population_at_full_rate() {
        // The implicit classes hold exactly their share, so the minimum explicit budget equals the
        // explicit volume up to rounding.
        let classes = items(&[("a", 95.69999999999999), ("b", 11.799999999999999)]);
        let rates =
            adjust_sample_rates(&classes, 1.0, Some(5), Some(268.74999999999994), 1.0).unwrap();

        assert_close(rates.sample_rate(&"a"), 1.0);
        assert_close(rates.sample_rate(&"b"), 1.0);
        assert_close(rates.implicit_rate, 1.0);
        assert_bounded(&rates);
    }

    #[test]
    fn test_unknown_class_uses_implicit_rate() {
        let classes = items(&[("a", 100.0), ("b", 20.0)]);
        let rates = adjust_sample_rates(&classes, 0.5, Some(4), Some(200.0), 1.0).unwrap();

        assert_close(rates.sample_rate(&"c"), 0.6875);
    }

    #[test]
    fn test_only_implicit_classes() {
        let classes = items(&[]);
        let rates = adjust_sample_rates(&classes, 0.1, Some(3), Some(300.0), 1.0).unwrap();

        assert!(rates.classes.is_empty());
        assert_close(rates.implicit_rate, 0.1);
    }

    #[test]
    fn test_no_classes() {
        let classes = items(&[]);
        let result = adjust_sample_rates(&classes, 0.5, None, None, 1.0);

        assert_eq!(result, Err(RebalancingError::NoClasses));
    }

    #[test]
    fn test_implicit_classes_without_volume() {
        let classes = items(&[("a", 10.0)]);
        let result = adjust_sample_rates(&classes, 0.0, Some(2), None, 1.0);

        assert_eq!(result, Err(RebalancingError::NoImplicitVolume));
    }

    #[test]
    fn test_conservation_at_full_intensity() {
        let classes = items(&[
            ("a", 5000.0),
            ("b", 1200.0),
            ("c", 800.0),
            ("d", 90.0),
            ("e", 3.0),
        ]);

        let scenarios = [
            // (total_num_classes, total, rate)
            (None, None, 0.2),
            (None, None, 0.01),
            (Some(10), Some(8000.0), 0.05),
            (Some(10), Some(7200.0), 0.3),
            (Some(6), Some(100_000.0), 0.2),
            (Some(50), Some(7100.0), 0.9),
        ];

        for (total_num_classes, total, rate) in scenarios {
            let rates =
                adjust_sample_rates(&classes, rate, total_num_classes, total, 1.0).unwrap();

            assert_eq!(rates.classes.len(), classes.len());
            assert_bounded(&rates);
            assert_conserved(&rates, &classes, total.unwrap_or(7093.0), rate);
        }
    }
}
