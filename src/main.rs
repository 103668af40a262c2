#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = prepdesk::run().await {
        eprintln!("prepdesk fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
