//! ## aether-cli
//! **Command-line front end for Aether simulations**
//!
//! - `aether run`: walker demo on the virtual clock, printed as a YAML report
//! - `aether sort`: sleep sort in virtual time
//! - `aether units`: the time unit table
//!
//! Everything runs on a single-threaded runtime so that each advance drains
//! every woken actor before the clock moves on.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    commands::run_command(cli).await
}
