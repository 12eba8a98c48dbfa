//! Logging setup.
//!
//! The subscriber is installed once at startup with a level picked from the
//! command line. Configuration validation may later change the level based
//! on `verbose-level`, so the level filter sits behind a reload handle.

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

static LEVEL_HANDLE: OnceCell<reload::Handle<LevelFilter, Registry>> = OnceCell::new();

/// Map a verbosity count to a level: 0 warn, 1 info, 2 and above debug.
pub fn level_for_verbosity(verbosity: i64) -> LevelFilter {
    match verbosity {
        i64::MIN..=0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Event targets are printed at the highest CLI verbosity (`-vv`).
fn shows_targets(verbosity: u8) -> bool {
    verbosity >= 2
}

/// Install the global subscriber. `RUST_LOG` narrows output further when set.
pub fn init_logging(verbosity: u8) {
    let (level, handle) = reload::Layer::new(level_for_verbosity(i64::from(verbosity)));
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    let installed = tracing_subscriber::registry()
        .with(level)
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(shows_targets(verbosity))
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok();

    if installed {
        let _ = LEVEL_HANDLE.set(handle);
    }
}

/// Change the global log level. A no-op until [`init_logging`] has run.
pub fn set_verbosity(verbosity: i64) {
    if let Some(handle) = LEVEL_HANDLE.get() {
        if let Err(e) = handle.modify(|filter| *filter = level_for_verbosity(verbosity)) {
            eprintln!("Failed to change log level: {}", e);
        }
    }
}
