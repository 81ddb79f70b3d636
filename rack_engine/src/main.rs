use anyhow::Result;

mod cli;
mod runtime;
mod summary;

use cli::Command;

fn main() -> Result<()> {
    env_logger::init();

    match cli::parse()? {
        Command::Simulate(args) => runtime::execute(args),
        Command::Occupancy(args) => summary::execute(args),
    }
}
