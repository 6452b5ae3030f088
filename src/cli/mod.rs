//! Command-line interface: compression reports over bitset fixtures.
//!
//! Each command is implemented as a submodule exposing a `COMMAND_NAME`,
//! a `cli` function adding it to the [`Command`] and a `main` function
//! running it on the parsed matches.

use anyhow::Result;
use clap::{Args, Command, ValueEnum};
use std::path::PathBuf;

pub mod file;
pub mod fixtures;
pub mod report;
pub mod speed;

/// Which codecs a command runs
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecChoice {
    Bitrat,
    Nibbler,
    #[default]
    Both,
}

impl CodecChoice {
    pub fn bitrat(self) -> bool {
        matches!(self, CodecChoice::Bitrat | CodecChoice::Both)
    }

    pub fn nibbler(self) -> bool {
        matches!(self, CodecChoice::Nibbler | CodecChoice::Both)
    }
}

/// Shared CLI arguments for commands reading a JSON bitset fixture.
#[derive(Args, Debug)]
pub struct FixtureArgs {
    /// The JSON file with the bitsets, as `{rowCount, columnCount, bitsets: {name: {set, presence}}}`
    pub fixture: PathBuf,

    #[arg(long, default_value_t = false)]
    /// Start every BitRat chunk expecting 0s instead of continuing the previous chunk.
    pub no_continuation: bool,
}

impl FixtureArgs {
    pub fn harness_options(&self) -> crate::harness::HarnessOptions {
        crate::harness::HarnessOptions {
            thread_continuation: !self.no_continuation,
        }
    }
}

/// The entry point of the command-line interface.
pub fn main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();

    let command = Command::new("bitmate")
        .about("Compare the BitRat and Nibbler bitset codecs on real data.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help(
            "Environment (noteworthy environment variables used):
RUST_LOG: configuration for env_logger, `debug` shows every encoded chunk,
  `trace` also shows escaped blocks and Nibbler segments.
",
        );

    let command = report::cli(command);
    let command = speed::cli(command);
    let command = file::cli(command);
    let matches = command.get_matches_from(args);

    match matches.subcommand() {
        Some((report::COMMAND_NAME, sub_m)) => report::main(sub_m)?,
        Some((speed::COMMAND_NAME, sub_m)) => speed::main(sub_m)?,
        Some((file::COMMAND_NAME, sub_m)) => file::main(sub_m)?,
        // clap should catch these
        Some((command_name, _)) => anyhow::bail!("Unknown command: {:?}", command_name),
        None => anyhow::bail!("No command given"),
    }

    log::info!("The command took {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(())
}
