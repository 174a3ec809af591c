//! Binary entry point for the `bgzf` command-line tool.
//!
//! A thin front-end over [`bgzf::Reader`]/[`bgzf::Writer`] for manual
//! testing and scripting — compress or decompress a whole file, or probe
//! one for the magic end-of-stream member. No index building, no
//! BAM/tabix/FASTA awareness: those remain out of scope for this crate.

use std::io::{Read, Write};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::error;

use bgzf::io::{open_input, open_output};
use bgzf::{Reader, Writer};

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Mode {
    /// Compress `input` into a BGZF stream.
    Compress,
    /// Decompress a BGZF stream back into raw bytes.
    Decompress,
    /// Check that `input` ends with the BGZF magic EOF member.
    Test,
}

/// Compress or decompress BGZF (block-gzip) streams.
#[derive(Parser)]
#[command(name = "bgzf", version, about)]
struct Cli {
    /// Operation to perform.
    #[arg(value_enum, short, long)]
    mode: Mode,

    /// Input path, or `-` for standard input.
    input: String,

    /// Output path, or `-` for standard output. Ignored in `test` mode.
    #[arg(default_value = "-")]
    output: String,

    /// Number of worker threads (read-ahead for decompress, compression
    /// workers for compress). `0` uses the host's default parallelism.
    #[arg(short = '@', long, default_value_t = 0)]
    workers: usize,

    /// Gzip compression level (0-9), compress mode only.
    #[arg(short, long, default_value_t = 6)]
    level: u32,
}

fn run(cli: Cli) -> bgzf::Result<()> {
    match cli.mode {
        Mode::Compress => {
            let input = open_input(&cli.input)?;
            let output = open_output(&cli.output)?;
            compress(input, output, cli.level, cli.workers)
        }
        Mode::Decompress => {
            let input = open_input(&cli.input)?;
            let mut output = open_output(&cli.output)?;
            decompress(input, &mut output, cli.workers)
        }
        Mode::Test => {
            let path = std::path::Path::new(&cli.input);
            let found = Reader::has_eof_path(path)?;
            if found {
                println!("{}: ok (BGZF magic EOF present)", cli.input);
                Ok(())
            } else {
                println!("{}: no BGZF magic EOF found", cli.input);
                Err(bgzf::Error::NoEnd)
            }
        }
    }
}

fn compress(
    mut input: Box<dyn Read + Send>,
    output: Box<dyn Write>,
    level: u32,
    workers: usize,
) -> bgzf::Result<()> {
    let mut writer = Writer::new_level(output, level, workers)?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = input.read(&mut buf).map_err(bgzf::Error::from)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    writer.close()
}

fn decompress(
    input: Box<dyn Read + Send>,
    output: &mut Box<dyn Write>,
    workers: usize,
) -> bgzf::Result<()> {
    let mut reader = Reader::new(input, workers)?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n]).map_err(bgzf::Error::from)?;
    }
    output.flush().map_err(bgzf::Error::from)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("bgzf: {e}");
            ExitCode::FAILURE
        }
    }
}
