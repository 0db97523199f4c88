use std::fmt;

/// Configuration precondition violations (spec.md §7: "Configuration errors ...
/// surfaced at config construction as a precondition violation; no solver is
/// created").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    InvalidStack(i32),
    InvalidBlinds { small_blind: i32, big_blind: i32 },
    InvalidMaxRaises(usize),
    InvalidCheckFrequency,
    InvalidIterationBounds { min: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidStack(stack) => {
                write!(f, "stack must be positive, got {stack}")
            }
            ConfigError::InvalidBlinds {
                small_blind,
                big_blind,
            } => write!(
                f,
                "blinds must satisfy big_blind >= small_blind > 0, got small={small_blind} big={big_blind}"
            ),
            ConfigError::InvalidMaxRaises(n) => {
                write!(f, "max_raises_per_street must be >= 1, got {n}")
            }
            ConfigError::InvalidCheckFrequency => {
                write!(f, "check_frequency must be >= 1")
            }
            ConfigError::InvalidIterationBounds { min, max } => write!(
                f,
                "min_iterations ({min}) must be <= max_iterations ({max}), and max_iterations must be > 0"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
