use super::fixtures::read_bitsets;
use super::FixtureArgs;
use crate::harness::{compressed_size, BitRatCodec, ChunkCodec, NibblerCodec};
use crate::utils::{describe_density, format_length};
use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;
use std::time::{Duration, Instant};

pub const COMMAND_NAME: &str = "speed";

#[derive(Args, Debug)]
#[command(about = "Times BitRat against Nibbler on every column of a fixture", long_about = None)]
struct CliArgs {
    #[clap(flatten)]
    fixture: FixtureArgs,

    /// How many passes over all columns before measuring
    #[clap(long, default_value_t = 5)]
    warmup: usize,

    /// How many times each column is encoded per measurement
    #[clap(long, default_value_t = 80)]
    reps: usize,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

/// Encodes `bitset` `reps` times, returning the last size and the total time
fn time_codec<C: ChunkCodec>(codec: &mut C, bitset: &[u8], reps: usize) -> Result<(usize, Duration)> {
    let start = Instant::now();
    let mut size = 0;
    for _ in 0..reps {
        size = compressed_size(codec, bitset)?;
    }
    Ok((size, start.elapsed()))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    let bitsets = read_bitsets(&args.fixture.fixture)?;
    let mut rat = BitRatCodec::new(args.fixture.harness_options());
    let mut nibbler = NibblerCodec::new();

    info!("Warming up with {} passes", args.warmup);
    for _ in 0..args.warmup {
        for record in bitsets.bitsets.values() {
            compressed_size(&mut rat, record.bytes())?;
            compressed_size(&mut nibbler, record.bytes())?;
        }
    }

    for (name, record) in &bitsets.bitsets {
        let (rat_size, rat_time) = time_codec(&mut rat, record.bytes(), args.reps)?;
        let (nibbler_size, nibbler_time) = time_codec(&mut nibbler, record.bytes(), args.reps)?;
        println!(
            "Column '{}' ({}): compress {}/{}; time {:.2} / {:.2} msec (bitrat/nibbler)",
            name,
            describe_density(record.set, bitsets.row_count),
            format_length(rat_size),
            format_length(nibbler_size),
            rat_time.as_secs_f64() * 1000.0,
            nibbler_time.as_secs_f64() * 1000.0
        );
    }
    Ok(())
}
