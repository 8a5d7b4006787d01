use clap::Parser;
use pantry_gateway::{run, Cli};
use pantry_observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format, &cli.log_level);

    info!("starting pantry gateway");
    run(cli).await?;
    Ok(())
}
