use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A class of events together with the sample rate assigned to it by rebalancing.
///
/// Classes are typically projects or transaction names. The identifier only has to be totally
/// ordered, since it breaks ties between classes that observed the same number of events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancedItem<T> {
    /// Identifier of the class.
    pub id: T,
    /// Number of events observed for this class.
    pub count: f64,
    /// The sample rate computed for this class.
    ///
    /// This is `0.0` until the class has been rebalanced.
    #[serde(default)]
    pub new_sample_rate: f64,
}

impl<T> RebalancedItem<T> {
    /// Creates a class that has not been assigned a sample rate yet.
    pub fn new(id: T, count: f64) -> Self {
        Self {
            id,
            count,
            new_sample_rate: 0.0,
        }
    }

    /// Returns the expected number of events kept when sampling at [`Self::new_sample_rate`].
    pub fn kept_count(&self) -> f64 {
        self.count * self.new_sample_rate
    }

    /// Copies this class with a new sample rate.
    pub(crate) fn with_sample_rate(&self, new_sample_rate: f64) -> Self
    where
        T: Clone,
    {
        Self {
            id: self.id.clone(),
            count: self.count,
            new_sample_rate,
        }
    }
}

/// Returns the sum of all counts, or `0.0` if there are no classes.
pub fn sum_counts<T>(items: &[RebalancedItem<T>]) -> f64 {
    items.iter().fold(0.0, |total, item| total + item.count)
}

/// Orders classes by descending `(count, id)`.
fn by_volume_desc<T: Ord>(a: &RebalancedItem<T>, b: &RebalancedItem<T>) -> Ordering {
    b.count.total_cmp(&a.count).then_with(|| b.id.cmp(&a.id))
}

/// Returns references to the given classes, sorted descending by `(count, id)`.
///
/// Iterating the result in reverse yields the smallest class first, which is the order in which
/// rebalancing hands out budget. The sort is stable, so duplicate classes keep their input order.
pub(crate) fn sort_by_volume<T: Ord>(items: &[RebalancedItem<T>]) -> Vec<&RebalancedItem<T>> {
    let mut sorted: Vec<_> = items.iter().collect();
    sorted.sort_by(|a, b| by_volume_desc(a, b));
    sorted
}
