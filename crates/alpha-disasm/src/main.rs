use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use alpha_disasm::{load, Loaded};
use alpha_rs::disasm::{listing_entries, listing_line, Rendered};
use alpha_rs::{CpuConfig, Machine};

#[derive(Parser, Debug)]
#[command(author, version, about = "Alpha AXP disassembler and interpreter CLI", long_about=None)]
struct Cli {
    /// Load address for raw (non-ELF) binaries
    #[arg(long, default_value = "0x120000000", value_parser = parse_u64)]
    base: u64,
    /// Input ELF64 executable or raw binary
    #[arg(value_name = "FILE")]
    input: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loadable segments, the text section and the entry point
    Sections {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Disassemble the text section
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Execute from the entry point and print the transcript
    Run {
        /// JSON CpuConfig (stack placement, console port, step cap)
        #[arg(long, value_name = "FILE")]
        config: Option<String>,
        /// Override the step cap from the config
        #[arg(long)]
        max_steps: Option<u64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u64>()?)
    }
}

#[derive(Debug, serde::Serialize)]
struct ListEntry {
    offset: u64,
    #[serde(flatten)]
    insn: Rendered,
}

fn load_config(path: Option<&str>, max_steps: Option<u64>) -> Result<CpuConfig> {
    let mut config = match path {
        Some(p) => {
            let txt = std::fs::read_to_string(p).with_context(|| format!("reading {p}"))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing {p}"))?
        }
        None => CpuConfig::default(),
    };
    if max_steps.is_some() {
        config.max_steps = max_steps;
    }
    Ok(config)
}

fn print_sections(loaded: &Loaded, format: OutputFormat) -> Result<()> {
    let img = &loaded.image;
    if format == OutputFormat::Json {
        let json = match &loaded.elf {
            Some(elf) => serde_json::to_string_pretty(elf)?,
            None => serde_json::to_string_pretty(img)?,
        };
        println!("{json}");
        return Ok(());
    }

    println!("entry {:#x}", img.entry);
    println!("{:<10} {:<18} {:<18} {:<8}", "segment", "start", "end", "size");
    for (i, s) in img.segments.iter().enumerate() {
        println!("{:<10} {:#018x} {:#018x} {:#x}", format!("load{i}"), s.vaddr, s.end(), s.bytes.len());
    }
    if let Some(elf) = &loaded.elf {
        println!("{:<18} {:<18} {:<10} {:<10} {:<6}", "section", "addr", "offset", "size", "flags");
        for s in &elf.sections {
            println!("{:<18} {:#018x} {:#010x} {:#010x} {:#x}", s.name, s.sh_addr, s.sh_offset, s.sh_size, s.sh_flags);
        }
    }
    let t = img.text;
    println!("text {:#x}..{:#x} (file offset {:#x})", t.vaddr, t.end(), t.file_offset);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let loaded = load(Path::new(&cli.input), cli.base)?;

    match cli.cmd {
        Command::Sections { format } => print_sections(&loaded, format)?,
        Command::List { format, out } => {
            let entries = listing_entries(&loaded.image);
            let buf = match format {
                OutputFormat::Text => {
                    let mut s = String::new();
                    for (off, r) in &entries {
                        s.push_str(&listing_line(*off, r));
                        s.push('\n');
                    }
                    s
                }
                OutputFormat::Json => {
                    let rows: Vec<ListEntry> =
                        entries.into_iter().map(|(offset, insn)| ListEntry { offset, insn }).collect();
                    serde_json::to_string_pretty(&rows)? + "\n"
                }
            };
            if let Some(path) = out { std::fs::write(path, buf)?; } else { print!("{}", buf); }
        }
        Command::Run { config, max_steps, format } => {
            let config = load_config(config.as_deref(), max_steps)?;
            let report = Machine::new(&loaded.image, config)?.run();
            match format {
                OutputFormat::Text => println!("{}", report.transcript),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            if !report.succeeded() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_u64_hex_and_dec() {
        assert_eq!(parse_u64("0x120000000").unwrap(), 0x1_2000_0000);
        assert_eq!(parse_u64("16").unwrap(), 16);
        assert!(parse_u64("zz").is_err());
    }

    #[test]
    fn config_override_keeps_file_values() {
        let path = std::env::temp_dir().join("_alpha_disasm_cfg.json");
        std::fs::write(&path, r#"{ "stack_size": 4096, "max_steps": 10 }"#).unwrap();
        let cfg = load_config(path.to_str(), Some(99)).unwrap();
        assert_eq!(cfg.stack_size, 4096);
        assert_eq!(cfg.stack_start, CpuConfig::default().stack_start);
        assert_eq!(cfg.max_steps, Some(99));
        let _ = std::fs::remove_file(&path);
    }
}
