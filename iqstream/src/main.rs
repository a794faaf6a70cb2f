use iqstream_device::{Relay, RelayConfig, enumerate, make_device};
use iqstream_messages::{DeviceArgs, SampleFormat};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::Write;

/// Stream complex baseband samples between files and a simulated RF channel
#[derive(Parser, Debug)]
#[command(name = "iqstream")]
#[command(version, about, long_about = None)]
struct Args {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the devices matching ARGS (e.g. "driver=file,path=rx.txt")
    Find {
        #[arg(value_name = "ARGS", default_value = "")]
        args: DeviceArgs,
    },
    /// Replay a source device through the virtual channel into a sink device
    Relay {
        /// Source device arguments
        #[arg(long, value_name = "ARGS")]
        from: DeviceArgs,

        /// Sink device arguments
        #[arg(long, value_name = "ARGS")]
        to: DeviceArgs,

        /// Stream format: CS8 or CF32
        #[arg(long, default_value = "CF32")]
        format: SampleFormat,

        /// End a burst after every chunk read from the source
        #[arg(long)]
        burst_per_chunk: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} - mod path |{}| - target | {} | args: |{}|",
                record.level(),
                record.module_path().unwrap_or(""),
                record.target(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Find { args } => {
            for device in enumerate(&args) {
                println!("{device}");
            }
        }
        Command::Relay {
            from,
            to,
            format,
            burst_per_chunk,
        } => {
            let source = make_device(&from).with_context(|| format!("Invalid source '{from}'"))?;
            let sink = make_device(&to).with_context(|| format!("Invalid sink '{to}'"))?;
            let config = RelayConfig {
                format,
                burst_per_chunk,
            };

            let stats = Relay::new(source, sink, config).run()?;
            println!(
                "transmitted {} samples in {} bursts, received {}",
                stats.transmitted, stats.bursts, stats.received
            );
        }
    }

    Ok(())
}
