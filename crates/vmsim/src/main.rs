use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use vmm::{MemoryConfig, TlbPolicy, TranslationEngine};

mod console;
mod input;
mod render;
mod session;
mod shell;

use console::Console;
use input::Radix;
use session::Session;

#[derive(Parser)]
#[command(name = "vmsim")]
#[command(about = "Virtual memory translation simulator with a TLB and on-demand paging")]
struct Args {
    /// Page size in bytes (a power of two)
    #[arg(long, global = true, default_value_t = MemoryConfig::default().page_size)]
    page_size: u64,

    /// Size of the virtual address space in bytes
    #[arg(long, global = true, default_value_t = MemoryConfig::default().virtual_memory_size)]
    virtual_size: u64,

    /// Size of physical memory in bytes
    #[arg(long, global = true, default_value_t = MemoryConfig::default().physical_memory_size)]
    physical_size: u64,

    /// Number of TLB entries
    #[arg(long, global = true, default_value_t = MemoryConfig::default().tlb_capacity)]
    tlb_size: usize,

    /// TLB replacement policy
    #[arg(long, global = true, value_enum, default_value_t = PolicyArg::Fifo)]
    policy: PolicyArg,

    /// Pause between batch translations, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Seed for random address generation
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Write statistics and the access history to this file before exiting
    #[arg(long, global = true)]
    export: Option<PathBuf>,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn memory_config(&self) -> MemoryConfig {
        MemoryConfig {
            page_size: self.page_size,
            virtual_memory_size: self.virtual_size,
            physical_memory_size: self.physical_size,
            tlb_capacity: self.tlb_size,
            tlb_policy: self.policy.into(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Translate addresses and show each translation in detail
    Translate {
        /// Addresses to translate, decimal unless --hex is given
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Read addresses as hexadecimal (e.g., 1A2B3C or 0x1A2B3C)
        #[arg(long)]
        hex: bool,
    },
    /// Translate uniformly random addresses
    Random {
        /// Number of addresses (1-10000)
        #[arg(short = 'n', long, default_value_t = 10, value_parser = parse_count)]
        count: u32,
    },
    /// Translate the decimal addresses listed in a file, one per line
    Load {
        /// Address file; blank lines and lines starting with # are ignored
        path: PathBuf,
    },
    /// Read commands from standard input
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Fifo,
    Lru,
}

impl From<PolicyArg> for TlbPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Fifo => TlbPolicy::Fifo,
            PolicyArg::Lru => TlbPolicy::Lru,
        }
    }
}

fn parse_count(text: &str) -> Result<u32, String> {
    let count = text.parse::<u32>().map_err(|err| err.to_string())?;
    input::check_count(count)
}

fn main() -> ExitCode {
    let args = Args::parse();
    Console::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TranslationEngine::new(args.memory_config())?;
    let mut session = Session::new(engine, args.delay_ms.map(Duration::from_millis), args.seed);
    let mut out = io::stdout().lock();

    render::configuration(&mut out, session.engine())?;
    writeln!(out)?;

    let interactive = matches!(args.command, Command::Shell);
    match args.command {
        Command::Translate { addresses, hex } => {
            let radix = if hex { Radix::Hexadecimal } else { Radix::Decimal };
            session.translate_each(&mut out, &addresses, radix)?;
        }
        Command::Random { count } => {
            session.random(&mut out, count)?;
        }
        Command::Load { path } => {
            session.load(&mut out, &path)?;
        }
        Command::Shell => shell::run(&mut session, io::stdin().lock(), &mut out)?,
    }

    if !interactive {
        writeln!(out)?;
        render::statistics(&mut out, &session.engine().statistics())?;
    }

    if let Some(path) = &args.export {
        session.export_to(path)?;
        log::info!("exported statistics to {}", path.display());
    }

    Ok(())
}
