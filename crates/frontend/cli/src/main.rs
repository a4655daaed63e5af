use anyhow::{Context, Result};
use clap::Parser;
use fami_core::logging::{LogConfig, LogLevel};
use fami_nes::Nes;
use std::fs;
use std::path::PathBuf;

/// Run an iNES ROM on the interpreter core.
#[derive(Parser)]
#[command(name = "famicore", version, about)]
struct Args {
    /// Path to an iNES ROM file
    rom: PathBuf,

    /// Start PC override (hex, e.g. C000) instead of the reset vector
    #[arg(long, value_parser = parse_hex_u16)]
    pc: Option<u16>,

    /// Stop after this many instructions (default: run until a fault)
    #[arg(long)]
    steps: Option<u64>,

    /// Print one trace line per instruction to stdout
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Verbosity for all log categories (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Dump the final machine state as JSON after the run
    #[arg(long, default_value_t = false)]
    dump_state: bool,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex address {s:?}: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = LogLevel::from_str(&args.log_level)
        .with_context(|| format!("unknown log level {:?}", args.log_level))?;
    LogConfig::global().set_all(level);

    let data =
        fs::read(&args.rom).with_context(|| format!("reading {}", args.rom.display()))?;
    let mut nes = Nes::from_ines_bytes(&data)?;
    nes.reset()?;
    if let Some(pc) = args.pc {
        nes.set_pc(pc);
    }

    let mut executed: u64 = 0;
    let outcome = loop {
        if let Some(limit) = args.steps {
            if executed >= limit {
                break Ok(());
            }
        }
        if args.trace {
            println!("{}", nes.trace_line()?);
        }
        match nes.step() {
            Ok(_) => executed += 1,
            Err(e) => break Err(e),
        }
    };

    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(&nes.debug_state())?);
    }

    if let Err(e) = outcome {
        // Leave the final machine state on stderr so faults are debuggable.
        eprintln!("halted after {executed} instructions: {e}");
        eprintln!("{}", serde_json::to_string_pretty(&nes.debug_state())?);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_pc_parsing() {
        assert_eq!(parse_hex_u16("C000"), Ok(0xC000));
        assert_eq!(parse_hex_u16("0xC000"), Ok(0xC000));
        assert_eq!(parse_hex_u16("$C000"), Ok(0xC000));
        assert!(parse_hex_u16("G000").is_err());
    }
}
