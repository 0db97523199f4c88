//! Shared type aliases, constants, configuration, and error types for the
//! HU-LHE CFR solver workspace.
//!
//! This crate has no game-specific logic. It exists so that `hulhe-cards`,
//! `hulhe-tree`, `hulhe-store`, `hulhe-cfr`, and `hulhe-parallel` all agree on
//! the same dimensional types (`Chips`, `Probability`, `Utility`, ...) and the
//! same configuration/error shapes.

mod config;
mod error;
#[cfg(feature = "server")]
mod logging;

pub use config::CFRConfig;
pub use config::GameParams;
pub use config::SamplingStrategy;
pub use error::ConfigError;

#[cfg(feature = "server")]
pub use logging::init_logging;
#[cfg(feature = "server")]
pub use logging::interrupted;
#[cfg(feature = "server")]
pub use logging::request_stop;
#[cfg(feature = "server")]
pub use logging::set_deadline;

/// Chip amounts, measured in small blinds throughout the solver.
pub type Chips = i32;
/// Expected values, regrets, and payoffs.
pub type Utility = f64;
/// Strategy weights, sampling distributions, and reach probabilities.
pub type Probability = f64;

/// Random-instance generation, used by validation fixtures and property tests.
pub trait Arbitrary {
    fn random() -> Self;
}

/// Street-independent raise cap shared by preflop and postflop in fixed-limit
/// HU hold'em unless a `GameParams` overrides it per street.
pub const DEFAULT_MAX_RAISES_PER_STREET: usize = 4;

/// Minimum positive probability floor used when normalizing regret-matching
/// distributions so that division by zero never occurs.
pub const PROBABILITY_FLOOR: Probability = 1e-12;

/// Regret floor used by variants other than CFR+ (which floors at exactly 0).
pub const REGRET_MIN: Utility = -3.0e5;
