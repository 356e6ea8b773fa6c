use clap::Parser;
use walker_cli::Cli;
use walker_cli::Subcommand;
use walker_cli::list_cmd;
use walker_cli::logging;
use walker_cli::serve_cmd;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = logging::init(cli.debug)?;

    match cli.subcommand {
        Subcommand::Serve(cmd) => serve_cmd::run(cmd, &log).await,
        Subcommand::List(cmd) => list_cmd::run(cmd).await,
    }
}
