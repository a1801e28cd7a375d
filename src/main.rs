//! HellPot
//!
//! Resolves startup configuration, prints the banner, then replays the
//! configuration log captured while resolving.

use anyhow::Result;
use clap::Parser;
use hellpot::cli::Cli;
use hellpot::config::defaults::app_label;
use hellpot::config::{Resolver, TomlStore};
use hellpot::logging::{DeferredLog, deferred_subscriber, init_logging};
use tracing::{debug, info};

fn print_banner() {
    println!("{}", app_label());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides();

    // Capture resolution output so it lands after the banner.
    let deferred = DeferredLog::new();
    let switch = deferred.clone();
    let mut resolver =
        Resolver::new(TomlStore::new()).with_debug_hook(move |debug| switch.set_debug(debug));
    let subscriber = deferred_subscriber(&deferred, overrides.debug);
    let resolved = tracing::subscriber::with_default(subscriber, || resolver.resolve(&overrides));

    print_banner();
    deferred.flush();

    let config = resolved
        .map_err(|err| {
            let code = err.code();
            anyhow::Error::new(err).context(format!("Startup aborted ({code})"))
        })?
        .freeze()?;
    init_logging(config, cli.log)?;

    info!(source = %config.source, listen = %config.listen_addr(), "Configuration resolved");
    debug!(
        config = %serde_json::to_string(config)?,
        routes = config.route_paths.len(),
        "Resolved values"
    );

    Ok(())
}
