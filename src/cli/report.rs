use super::fixtures::{read_bitsets, BitsetRecord};
use super::FixtureArgs;
use crate::harness::{compressed_size, BitRatCodec, HarnessOptions, NibblerCodec};
use crate::utils::{describe_density, format_length};
use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};

pub const COMMAND_NAME: &str = "report";

#[derive(Args, Debug)]
#[command(about = "Prints the raw, BitRat and Nibbler sizes of every column of a fixture", long_about = None)]
struct CliArgs {
    #[clap(flatten)]
    fixture: FixtureArgs,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    let bitsets = read_bitsets(&args.fixture.fixture)?;
    let options = args.fixture.harness_options();
    for (name, record) in &bitsets.bitsets {
        println!("{}", column_line(name, record, bitsets.row_count, options)?);
    }
    Ok(())
}

/// One line of the report
fn column_line(
    name: &str,
    record: &BitsetRecord,
    rows: usize,
    options: HarnessOptions,
) -> Result<String> {
    let raw = record.bytes();
    let rat = compressed_size(&mut BitRatCodec::new(options), raw)?;
    let nibbler = compressed_size(&mut NibblerCodec::new(), raw)?;
    Ok(format!(
        "Column '{}' ({}): {}(raw), {}(bitrat), {}(nibbler)",
        name,
        describe_density(record.set, rows),
        format_length(raw.len()),
        format_length(rat),
        format_length(nibbler)
    ))
}
