use super::CodecChoice;
use crate::harness::{encode_reader, BitRatCodec, ChunkCodec, HarnessOptions, NibblerCodec, StreamSummary};
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const COMMAND_NAME: &str = "file";

#[derive(Args, Debug)]
#[command(about = "Encodes a raw file chunk by chunk and prints the compression ratio", long_about = None)]
struct CliArgs {
    /// The file to encode, taken as one long bitset
    input: PathBuf,

    /// The codec(s) to run
    #[clap(short, long, default_value_t, value_enum)]
    codec: CodecChoice,

    /// Also write the encoded stream here (with `--codec both`, `.bitrat`
    /// and `.nibbler` are appended to the name)
    #[clap(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    /// Start every BitRat chunk expecting 0s instead of continuing the previous chunk.
    no_continuation: bool,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

/// Runs `codec` over the file at `input`, writing to `output` if given
fn encode_file<C: ChunkCodec>(codec: &mut C, input: &Path, output: Option<PathBuf>) -> Result<StreamSummary> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Cannot open {}", input.display()))?,
    );
    let summary = match output {
        Some(path) => {
            let mut writer = BufWriter::new(
                File::create(&path).with_context(|| format!("Cannot create {}", path.display()))?,
            );
            let summary = encode_reader(codec, reader, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("Cannot write {}", path.display()))?;
            info!("Encoded stream written to {}", path.display());
            summary
        }
        None => encode_reader(codec, reader, &mut std::io::sink())?,
    };
    Ok(summary)
}

/// The summary line, in kB and percent
fn summary_line(name: &str, summary: &StreamSummary) -> String {
    format!(
        "{}: read {:.1}kB, wrote {:.1}kB (in {} chunks), ratio {:.2}%",
        name,
        summary.bytes_read as f64 / 1024.0,
        summary.bytes_written as f64 / 1024.0,
        summary.chunks,
        100.0 * summary.ratio()
    )
}

fn output_path(output: &Option<PathBuf>, suffix: &str, both: bool) -> Option<PathBuf> {
    output.as_ref().map(|path| {
        if both {
            let mut name = path.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        } else {
            path.clone()
        }
    })
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    let both = args.codec == CodecChoice::Both;

    if args.codec.bitrat() {
        let mut codec = BitRatCodec::new(HarnessOptions {
            thread_continuation: !args.no_continuation,
        });
        let output = output_path(&args.output, ".bitrat", both);
        let summary = encode_file(&mut codec, &args.input, output)?;
        println!("{}", summary_line(codec.name(), &summary));
    }
    if args.codec.nibbler() {
        let mut codec = NibblerCodec::new();
        let output = output_path(&args.output, ".nibbler", both);
        let summary = encode_file(&mut codec, &args.input, output)?;
        println!("{}", summary_line(codec.name(), &summary));
    }
    Ok(())
}
