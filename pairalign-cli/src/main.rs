pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{align::Align, command::Command};
use enum_dispatch::enum_dispatch;
use env_logger::Env;
use pairalign::util::version::built_info;

#[derive(Parser, Debug)]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[enum_dispatch(Command)]
#[derive(Parser, Debug)]
#[command(version = built_info::VERSION.as_str())]
enum Subcommand {
    Align(Align),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();
    args.subcommand.execute()
}
