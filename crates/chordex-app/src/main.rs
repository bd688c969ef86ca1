mod boot;
mod cli;
mod commands;
mod keyloop;

use tracing_subscriber::EnvFilter;

fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "chordex=info".parse().unwrap()),
            ),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Config comes first so `[logging] level` can seed the filter.
    let loaded = chordex_config::load_config(args.config.as_deref());
    let config_level = loaded
        .as_ref()
        .map(|c| format!("chordex={}", c.logging.level))
        .unwrap_or_else(|_| "chordex=info".to_string());
    init_logging(args.log_level.as_deref().unwrap_or(&config_level));

    tracing::info!("Chordex v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        chordex_config::ChordexConfig::default()
    });

    if args.print_config {
        println!("{}", chordex_config::config_to_json(&config));
        return;
    }

    let mut session = boot::boot(&config, args.tabs).await;

    if let Some(path) = boot::rc_path(args.rc.as_deref(), &config) {
        if let Err(e) = boot::run_rc(&session.coordinator, &path).await {
            tracing::warn!("rc file skipped: {e}");
        }
    }

    if let Err(e) = keyloop::run(&mut session).await {
        tracing::error!("Input loop error: {e}");
    }
    tracing::info!("Shutdown complete");
}
