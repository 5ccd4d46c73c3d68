/// An error returned when sample rates cannot be rebalanced.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RebalancingError {
    /// The population does not contain any classes.
    #[error("cannot rebalance a population without classes")]
    NoClasses,

    /// Implicit classes need a sample rate, but carry no volume to spread their budget over.
    #[error("implicit classes have no volume to assign a sample rate to")]
    NoImplicitVolume,

    /// The budget that must be spent exceeds the volume of the classes.
    #[error("minimum budget {min_budget} exceeds the total volume {total}")]
    InsufficientVolume {
        /// Total volume of the classes.
        total: f64,
        /// Budget that had to be spent on the classes.
        min_budget: f64,
    },

    /// The rebalancing input failed validation.
    #[error("invalid rebalancing input: {0}")]
    InvalidInput(&'static str),
}
