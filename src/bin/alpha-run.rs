use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use alpha_rs::{CpuConfig, LoadedImage, Machine};

fn parse_u64(s: &str) -> Result<u64, String> {
    let r = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    r.map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a flat Alpha image on the alpha-rs interpreter"
)]
struct Opts {
    /// Load address of the first byte of the image.
    #[arg(short, long, default_value = "0x120000000", value_parser = parse_u64)]
    base: u64,
    /// Entry point; defaults to the load address.
    #[arg(short, long, value_parser = parse_u64)]
    entry: Option<u64>,
    /// JSON CpuConfig; missing fields keep their defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<String>,
    #[arg(long)]
    max_steps: Option<u64>,
    #[arg(value_name = "BINFILE")]
    input: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let bytes = std::fs::read(&opts.input).with_context(|| format!("reading {}", opts.input))?;
    let image = LoadedImage::flat(opts.base, bytes, opts.entry.unwrap_or(opts.base));

    let mut config = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing {path}"))?
        }
        None => CpuConfig::default(),
    };
    if opts.max_steps.is_some() {
        config.max_steps = opts.max_steps;
    }

    let report = Machine::new(&image, config)?.run();
    println!("{}", report.transcript);
    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
