//! The CFR/CFR+ traversal engine, its Monte Carlo sampling variants, the
//! stopping controller, and convergence metrics.

mod chance;
mod metrics;
mod stopping;
mod trainer;
mod traverse;

pub use chance::{deal_hole_cards, ChanceOutcome, ChanceProvider, Deal, FullDeckChance};
pub use metrics::{ConvergenceMetrics, IterationSample};
pub use stopping::{StopReason, StoppingController};
pub use trainer::{get_average_strategy, get_current_strategy, train, SolverState, TrainingStats};
pub use traverse::{traverse, TraversalContext};
