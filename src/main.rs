use anyhow::Result;
use tracing::info;

fn main() -> Result<()> {
    // stdout carries the UCI conversation; keep diagnostics on stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("sable starting");
    sable_uci::UciEngine::new().run()?;
    Ok(())
}
