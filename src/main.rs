use clap::Parser;
use tradefuse::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
