use anyhow::Result;
use clap::Parser;
use scribed::cli::Cli;
use scribed::config::Config;
use scribed::server::protocol::ServerMode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)?.with_env_overrides();

    // CLI flags override file and environment
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(model) = cli.model {
        config.stt.model_path = model;
    }
    if let Some(language) = cli.language {
        config.stt.language = language;
    }
    if cli.single_shot {
        config.server.mode = ServerMode::SingleShot;
    }

    tracing::info!("scribed {}", scribed::version_string());

    run_server(config).await
}

#[cfg(feature = "whisper")]
async fn run_server(config: Config) -> Result<()> {
    use scribed::server::AppState;
    use scribed::stt::whisper::{WhisperConfig, WhisperTranscriber};
    use std::sync::Arc;

    let transcriber = WhisperTranscriber::new(WhisperConfig {
        model_path: config.stt.model_path.clone().into(),
        threads: None,
    })?;
    tracing::info!(model = transcriber.model_name(), "model loaded");

    let state = AppState::new(Arc::new(transcriber), &config);
    scribed::server::serve(&config, state).await?;
    Ok(())
}

#[cfg(not(feature = "whisper"))]
async fn run_server(_config: Config) -> Result<()> {
    anyhow::bail!(
        "this binary was built without a recognizer backend; \
         rebuild with the default features (cargo build --release)"
    )
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scribed={}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
