use std::{error::Error, sync::Arc};

use binjr_core::{
    adapters::transport::ReqwestTransport,
    cli::{commands::Cli, run},
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli, Arc::new(ReqwestTransport::new()?)).await?;
    Ok(())
}
