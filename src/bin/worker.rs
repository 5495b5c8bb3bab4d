#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = mentora_rust::run_worker().await {
        eprintln!("mentora-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
