use anyhow::Result;
use clap::Parser;
use cdek_proxy::config::loader;
use cdek_proxy::config::settings::SettingsOverrides;
use cdek_proxy::server;
use cdek_proxy::utils::logging::{self, LogLevel};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// optional YAML settings file
    #[arg(short, long, env = "CONFIG")]
    config: Option<String>,
    #[arg(long, env = "PORT")]
    port: Option<u16>,
    #[arg(long, env = "CDEK_CLIENT_ID")]
    client_id: Option<String>,
    #[arg(long, env = "CDEK_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
    /// value of Access-Control-Allow-Origin
    #[arg(long, env = "CORS_ORIGIN")]
    cors_origin: Option<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read arguments / environment
    // -------------------------------

    let args = Args::parse();
    let overrides = SettingsOverrides {
        port: args.port,
        client_id: args.client_id,
        client_secret: args.client_secret,
        cors_origin: args.cors_origin,
    };

    // -------------------------------
    // 2. Resolve settings and logging
    // -------------------------------

    let settings = loader::load(args.config.as_deref(), overrides).await?;
    logging::run(&settings, args.log_level);

    // -------------------------------
    // 3. Serve until shutdown signal
    // -------------------------------

    info!("Service starting...");
    server::server::start(&settings).await
}
