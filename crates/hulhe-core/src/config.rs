use crate::error::ConfigError;
use crate::Chips;
use crate::Probability;
use crate::Utility;

/// Table stakes and fixed-limit structure for one HU-LHE solve.
///
/// Pot and chip quantities elsewhere in the solver are expressed in units of
/// `small_blind`; `big_blind` is conventionally `2 * small_blind` but is kept
/// as an independent field since some rule sets use other ratios.
///
/// # Preconditions (checked in [`GameParams::new`])
///
/// - `big_blind >= small_blind > 0`
/// - `max_raises_per_street >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameParams {
    pub stack: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_raises_per_street: usize,
}

impl GameParams {
    /// Construct validated game parameters, or fail with a [`ConfigError`]
    /// precondition violation. No `GameTree` or `CFREngine` is ever handed an
    /// unvalidated `GameParams`.
    pub fn new(
        stack: Chips,
        small_blind: Chips,
        big_blind: Chips,
        max_raises_per_street: usize,
    ) -> Result<Self, ConfigError> {
        if small_blind <= 0 {
            return Err(ConfigError::InvalidBlinds {
                small_blind,
                big_blind,
            });
        }
        if big_blind < small_blind {
            return Err(ConfigError::InvalidBlinds {
                small_blind,
                big_blind,
            });
        }
        if stack <= 0 {
            return Err(ConfigError::InvalidStack(stack));
        }
        if max_raises_per_street < 1 {
            return Err(ConfigError::InvalidMaxRaises(max_raises_per_street));
        }
        Ok(Self {
            stack,
            small_blind,
            big_blind,
            max_raises_per_street,
        })
    }

    /// Standard 100bb HU-LHE with a 4-bet cap: SB=1, BB=2, stack=400 (=100bb).
    pub fn standard() -> Self {
        Self::new(400, 1, 2, 4).expect("standard params are always valid")
    }
}

/// Sampling flavor used by the CFR engine during a single traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Full enumeration of every child at every node (vanilla / CFR+).
    None,
    /// Enumerate a random subset of chance outcomes.
    Chance,
    /// Enumerate the traverser's own actions; sample one opponent/chance outcome.
    External,
    /// Sample one full path end-to-end with importance-weighted utilities.
    Outcome,
}

/// Knobs controlling one CFR training run (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CFRConfig {
    pub use_cfr_plus: bool,
    pub use_linear_weighting: bool,
    pub use_sampling: bool,
    pub sampling_strategy: SamplingStrategy,
    pub sampling_probability: Probability,
    pub prune_threshold: Option<Utility>,
    pub discount_factor: Utility,
    pub max_iterations: usize,
    pub min_iterations: usize,
    pub target_exploitability: Utility,
    pub max_time_seconds: u64,
    pub check_frequency: usize,
}

impl CFRConfig {
    /// Validate (and lightly normalize) a proposed config. `sampling_probability`
    /// outside `(0, 1]` is clamped rather than rejected, per spec.md §4.6's
    /// "chance sampling with probability outside (0,1] clamps to the interval".
    /// Everything else is a hard precondition violation.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !(0.0 < self.sampling_probability && self.sampling_probability <= 1.0) {
            self.sampling_probability = self.sampling_probability.clamp(1e-6, 1.0);
        }
        if self.check_frequency == 0 {
            return Err(ConfigError::InvalidCheckFrequency);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterationBounds {
                min: self.min_iterations,
                max: self.max_iterations,
            });
        }
        if self.min_iterations > self.max_iterations {
            return Err(ConfigError::InvalidIterationBounds {
                min: self.min_iterations,
                max: self.max_iterations,
            });
        }
        Ok(self)
    }
}

impl Default for CFRConfig {
    fn default() -> Self {
        Self {
            use_cfr_plus: true,
            use_linear_weighting: true,
            use_sampling: false,
            sampling_strategy: SamplingStrategy::None,
            sampling_probability: 1.0,
            prune_threshold: None,
            discount_factor: 1.0,
            max_iterations: 1_000_000,
            min_iterations: 100,
            target_exploitability: 0.001,
            max_time_seconds: 3600,
            check_frequency: 100,
        }
    }
}
