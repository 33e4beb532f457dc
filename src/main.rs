use chirpstack_bridge::{chirpstack::Forwarder, config::Config, http};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chirpstack-bridge")]
#[command(about = "HTTP to ChirpStack gRPC downlink bridge")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Network server gRPC address (overrides chirpstack.server)
    #[arg(long, env = "CHIRPSTACK_SERVER")]
    server: Option<String>,

    /// API token (overrides chirpstack.api_token)
    #[arg(long, env = "CHIRPSTACK_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// FPort for enqueued downlinks (overrides chirpstack.f_port)
    #[arg(long, env = "CHIRPSTACK_F_PORT")]
    f_port: Option<u32>,

    /// HTTP listen address (overrides http.bind)
    #[arg(long, env = "BRIDGE_BIND")]
    bind: Option<String>,

    /// Downstream timeout in seconds (overrides chirpstack.timeout_secs)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(ref server) = self.server {
            config.chirpstack.server = server.clone();
        }
        if let Some(ref token) = self.api_token {
            config.chirpstack.api_token = token.clone();
        }
        if let Some(f_port) = self.f_port {
            config.chirpstack.f_port = f_port;
        }
        if let Some(ref bind) = self.bind {
            config.http.bind = bind.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.chirpstack.timeout_secs = timeout_secs;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Config file {:?} not found, using defaults", cli.config);
        Config::default()
    };
    cli.apply(&mut config);

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("chirpstack-bridge v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    let forwarder = Forwarder::new(&config.chirpstack)?;
    let router = http::create_router(Arc::new(forwarder));

    http::serve(&config.http.bind, router).await
}
