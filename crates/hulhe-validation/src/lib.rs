//! Canonical small-game fixtures with known equilibria.
//!
//! Three games anchor the solver's correctness independent of the full
//! HU-LHE tree: Rock-Paper-Scissors (a one-shot matrix game), Kuhn Poker
//! (a tiny sequential game with a closed-form equilibrium value), and the
//! HU-LHE betting tree itself reduced to a preflop-only, tiny-stack
//! instance. Each exposes a `run` that trains the
//! fixture and reports a [`FixtureResult`]; `hulhe-cli`'s `validate`
//! subcommand runs all three and prints PASS/FAIL.

pub mod betting;
pub mod kuhn;
pub mod rps;

/// Outcome of training one validation fixture against its declared
/// expected value and tolerance.
#[derive(Debug, Clone)]
pub struct FixtureResult {
    pub name: &'static str,
    pub observed_value: f64,
    pub expected_value: f64,
    pub tolerance: f64,
    pub infosets: usize,
}

impl FixtureResult {
    pub fn passed(&self) -> bool {
        (self.observed_value - self.expected_value).abs() <= self.tolerance
    }
}

/// Run all three reference fixtures with a shared iteration budget. Used by
/// `hulhe validate`; each fixture picks its own internal iteration count
/// where convergence requires more (or fewer) than `iterations`.
pub fn run_all(iterations: usize) -> Vec<FixtureResult> {
    let results = vec![
        rps::run(iterations),
        kuhn::run(iterations.max(5_000)),
        betting::run(),
    ];
    for result in &results {
        log::info!(
            "fixture {}: {} (observed={:.6} expected={:.6} tolerance={:.6})",
            result.name,
            if result.passed() { "PASS" } else { "FAIL" },
            result.observed_value,
            result.expected_value,
            result.tolerance
        );
    }
    results
}
