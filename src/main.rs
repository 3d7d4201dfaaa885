use clap::Parser;
use adrgate::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
