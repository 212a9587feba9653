use tracing::warn;
use tracing_subscriber::EnvFilter;
use video_proxy::Config;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration from CLI, environment and/or config file
    let config = Config::load().inspect_err(|error| {
        warn!(%error, "supabase-proxy: configuration is incomplete");
    })?;
    video_proxy::run(config).await
}
