//! Rebalancing of sample rates for dynamic sampling.
//!
//! Sampling every class of events (projects, transactions) at the same rate keeps the sampled data
//! dominated by the highest-volume classes. Rebalancing assigns each class an individual sample
//! rate such that
//!
//! - the population as a whole still keeps about `total * rate` events, and
//! - the kept events are distributed across classes as evenly as the configured `intensity`
//!   allows.
//!
//! # Explicit and Implicit Classes
//!
//! Classes listed in the input are *explicit* and each receive their own rate. A population may
//! also contain *implicit* classes, which are only known in aggregate through the total number of
//! classes and the total event volume. All implicit classes share one rate.
//!
//! # Algorithm
//!
//! Classes are processed from the smallest to the largest, ordered by `(count, id)`. Each class is
//! moved from its natural volume `count * rate` towards an ideal volume, which is an even share of
//! the remaining budget. Classes that would need a rate above `1.0` are sampled fully, and the
//! ideal of the remaining classes rises to make up for the budget they could not spend.
//!
//! # Example
//!
//! ```
//! use relay_rebalancing::{RebalancedItem, adjust_sample_rates};
//!
//! let classes = [
//!     RebalancedItem::new("frequent", 1000.0),
//!     RebalancedItem::new("rare", 10.0),
//! ];
//!
//! // Two more projects with a combined 990 events are known only in aggregate.
//! let rates = adjust_sample_rates(&classes, 0.1, Some(4), Some(2000.0), 1.0).unwrap();
//!
//! assert_eq!(rates.sample_rate(&"rare"), 1.0);
//! assert!(rates.sample_rate(&"frequent") < 0.1);
//! ```
#![warn(missing_docs)]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/getsentry/relay/master/artwork/relay-icon.png",
    html_favicon_url = "https://raw.githubusercontent.com/getsentry/relay/master/artwork/relay-icon.png"
)]

mod config;
mod error;
mod full;
mod item;
mod rebalance;

pub use self::config::*;
pub use self::error::*;
pub use self::full::*;
pub use self::item::{RebalancedItem, sum_counts};
pub use self::rebalance::*;
