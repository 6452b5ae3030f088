use anyhow::Result;
use bitmate::cli::main as cli_main;
use std::io::Write;

pub fn main() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{} {:.3}s {style}{}{style:#} {} - {}",
            buf.timestamp_millis(),
            start.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();

    // Call the main function of the CLI with cli args
    cli_main(std::env::args_os())
}
