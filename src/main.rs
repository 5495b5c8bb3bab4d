#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = mentora_rust::run().await {
        eprintln!("mentora-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
