use clap::Parser;
use memory_cli::cli::Cli;
use memory_cli::{commands, config, runtime::Runtime};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let memory_config = config::load(cli.config.as_deref(), cli.workspace)?;
    let runtime = Runtime::open(memory_config).await?;
    commands::dispatch(cli.command, runtime, cli.format).await
}
