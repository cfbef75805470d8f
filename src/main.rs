//! docviz - class and package diagrams for generated API documentation

mod diagram_cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docviz")]
#[command(about = "Class and package diagrams for generated API documentation", version)]
struct Cli {
    #[command(subcommand)]
    command: diagram_cli::DiagramCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    diagram_cli::run(cli.command).await?;

    Ok(())
}
