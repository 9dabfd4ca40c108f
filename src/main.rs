use clap::Parser;
use llm_stream_adapter::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Models(args) => cli::models::run(args).await,
        Command::Show(args) => cli::show::run(args).await,
        Command::Chat(args) => cli::chat::run(args).await,
        Command::Complete(args) => cli::complete::run(args).await,
    }
}
