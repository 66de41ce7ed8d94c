//! Logging setup.
//!
//! Five-step verbosity ladder driven by the repeatable `-v`/`-q` flags:
//! error, warn, info (the default), debug, trace. Per-declaration skip
//! messages sit at trace, so a default run only reports files and real
//! problems. `RUST_LOG` is honored when no flag is given.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber. Call once at startup.
pub fn init(verbose: u8, quiet: u8) {
    let level = level_for(verbose, quiet);
    let filter = if verbose == 0 && quiet == 0 {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("stubfill={}", level)))
    } else {
        EnvFilter::new(format!("stubfill={}", level))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn level_for(verbose: u8, quiet: u8) -> &'static str {
    match 2 + verbose as i32 - quiet as i32 {
        i32::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}
