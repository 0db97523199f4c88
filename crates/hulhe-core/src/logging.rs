use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use simplelog::{CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static DEADLINE: OnceLock<Instant> = OnceLock::new();

/// Initialize dual terminal + file logging for a long-running training or
/// validation session. Creates `logs/<unix-seconds>.log` relative to the
/// current directory; safe to call once per process.
pub fn init_logging(level: LevelFilter) -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let path = format!("logs/{timestamp}.log");
    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ),
        WriteLogger::new(level, Config::default(), File::create(path)?),
    ])?;
    Ok(())
}

/// Register a wall-clock deadline after which [`interrupted`] reports true
/// even without an explicit [`request_stop`] call. Call at most once; later
/// calls are ignored.
pub fn set_deadline(max_time: Duration) {
    let _ = DEADLINE.set(Instant::now() + max_time);
}

/// Cooperative cancellation flag checked by the CFR engine and parallel
/// coordinator between iterations. Training loops poll this rather than
/// being killed outright, so in-flight regret/policy tables stay consistent.
pub fn interrupted() -> bool {
    if INTERRUPTED.load(Ordering::Relaxed) {
        return true;
    }
    match DEADLINE.get() {
        Some(deadline) => Instant::now() >= *deadline,
        None => false,
    }
}

/// Request a graceful stop. Called from a ctrl-c handler or an operator
/// console; has no effect on work already committed this iteration.
pub fn request_stop() {
    INTERRUPTED.store(true, Ordering::Relaxed);
}
