//! presenced - persona state synchronization daemon
//!
//! Resolves the persona transport once, keeps the living state in sync and
//! mirrors the system state into a stylesheet of CSS variables.

use anyhow::Result;
use clap::Parser;
use presence::{sampler, LivingEngines, PresenceConfig};
use presence_visual::{Propagator, StylesheetSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Presence - persona synchronization daemon
#[derive(Parser, Debug)]
#[command(name = "presenced", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "/etc/presence/presence.yaml")]
    config: PathBuf,

    /// Native persona backend socket
    #[arg(short, long, env = "PRESENCE_SOCKET")]
    socket: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Always use the in-process persona engine
    #[arg(long)]
    fallback: bool,

    /// Module whose glow and motion are published
    #[arg(short, long)]
    module: Option<String>,

    /// Stylesheet to write
    #[arg(long)]
    stylesheet: Option<PathBuf>,

    /// Debug mode
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn apply(&self, config: &mut PresenceConfig) {
        if let Some(socket) = &self.socket {
            config.transport.socket_path = socket.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.sync.interval_ms = interval_ms;
        }
        if self.fallback {
            config.transport.force_fallback = true;
        }
        if let Some(module) = &self.module {
            config.visual.module = Some(module.clone());
        }
        if let Some(stylesheet) = &self.stylesheet {
            config.visual.stylesheet_path = stylesheet.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PresenceConfig::load(&args.config)?;
    args.apply(&mut config);

    let log_level = if args.debug {
        "debug".to_string()
    } else {
        config.daemon.log_level.clone()
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("Presence v{} starting", env!("CARGO_PKG_VERSION"));

    let engines = LivingEngines::connect(&config);

    let sink = Arc::new(StylesheetSink::new(&config.visual.stylesheet_path));
    engines.attach_visuals(
        Propagator::with_tables(sink, &config.visual.modules),
        config.visual.module.clone(),
    );
    info!(
        "Publishing style variables to {:?}",
        config.visual.stylesheet_path
    );

    if config.sampler.enabled {
        let interval = Duration::from_secs(config.sampler.interval_secs.max(1));
        tokio::spawn(sampler::run(engines.actions(), interval));
        info!("System sampler every {:?}", interval);
    }

    info!("Presence ready ({} transport)", engines.transport());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    engines.unmount();

    Ok(())
}
