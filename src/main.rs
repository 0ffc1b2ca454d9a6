use clap::Parser;
use bitage::cli::{Cli, run};
use bitage::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    run(cli)
}
