use influxdb_inspect::config::ExportConfig;
use influxdb_inspect::export::export;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = ExportConfig::from_args(std::env::args()).unwrap_or_else(|e| e.exit());
    setup_logging();

    export(config).await?;

    Ok(())
}

/// Logs go to stderr, stdout carries the export.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
