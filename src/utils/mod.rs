pub mod build_info;

use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Installs the global `fmt` subscriber. `RUST_LOG` directives are honoured on top of
/// the `finledger=info` default. Logs go to stderr so script output stays clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy();
        for directive in ["finledger=info", "finledger_core=info"] {
            if let Ok(directive) = directive.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
