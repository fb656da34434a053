use anyhow::Result;
use langpad::cli::{self, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // init logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = <Cli as clap::Parser>::parse();

    match cli.command {
        Commands::Status(args) => cli::handle_status(args),
        Commands::Set(args) => cli::handle_set(args),
        Commands::Load(args) => cli::handle_load(args),
        Commands::Check(args) => cli::handle_check(args),
    }
}
