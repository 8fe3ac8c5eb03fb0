#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = ministry_lms::run().await {
        eprintln!("ministry-lms fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
