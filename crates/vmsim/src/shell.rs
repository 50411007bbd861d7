//! Line-oriented interactive shell over a [`Session`].

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use vmm::TlbPolicy;

use crate::input::{Radix, parse_address};
use crate::render;
use crate::session::{CommandError, Session};

/// Records shown by `history` without an argument.
const DEFAULT_HISTORY: usize = 20;

const HELP: &str = "\
Commands:
  t <address>        translate a decimal address
  x <address>        translate a hexadecimal address (0x optional)
  random <count>     translate 1-10000 random addresses
  load <path>        translate the decimal addresses listed in a file
  policy fifo|lru    switch the TLB replacement policy
  reset              clear the TLB, page table, history and statistics
  stats              show statistics
  tlb                show TLB entries
  pt                 show the most recent page table entries
  frames             show which page each physical frame holds
  history [n]        show the last n accesses (default 20)
  export <path>      write statistics and the access history to a file
  help               show this message
  quit               leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Translate { address: u64, radix: Radix },
    Random(u32),
    Load(PathBuf),
    Policy(TlbPolicy),
    Reset,
    Stats,
    Tlb,
    PageTable,
    Frames,
    History(usize),
    Export(PathBuf),
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if words.next().is_some() {
        return Err(usage(format!("too many arguments to '{}'", name)));
    }

    let required = |what: &str| argument.ok_or_else(|| usage(format!("usage: {} {}", name, what)));

    let command = match name {
        "t" | "translate" => ShellCommand::Translate {
            address: parse_address(required("<address>")?, Radix::Decimal)?,
            radix: Radix::Decimal,
        },
        "x" | "hex" => ShellCommand::Translate {
            address: parse_address(required("<address>")?, Radix::Hexadecimal)?,
            radix: Radix::Hexadecimal,
        },
        "random" => {
            let count = required("<count>")?;
            ShellCommand::Random(
                count
                    .parse::<u32>()
                    .map_err(|_| usage(format!("'{}' is not a valid count", count)))?,
            )
        }
        "load" => ShellCommand::Load(required("<path>")?.into()),
        "policy" => ShellCommand::Policy(
            required("fifo|lru")?
                .parse::<TlbPolicy>()
                .map_err(|err| usage(err.to_string()))?,
        ),
        "export" => ShellCommand::Export(required("<path>")?.into()),
        "history" => ShellCommand::History(match argument {
            Some(n) => n
                .parse::<usize>()
                .map_err(|_| usage(format!("'{}' is not a valid count", n)))?,
            None => DEFAULT_HISTORY,
        }),
        "reset" | "stats" | "tlb" | "pt" | "frames" | "help" | "quit" | "exit"
            if argument.is_some() =>
        {
            return Err(usage(format!("'{}' takes no arguments", name)));
        }
        "reset" => ShellCommand::Reset,
        "stats" => ShellCommand::Stats,
        "tlb" => ShellCommand::Tlb,
        "pt" => ShellCommand::PageTable,
        "frames" => ShellCommand::Frames,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return Err(usage(format!("unknown command '{}', try 'help'", name))),
    };
    Ok(Some(command))
}

fn usage(message: String) -> CommandError {
    CommandError::Usage(message)
}

/// Reads commands until `quit` or end of input. Command failures are printed and the shell
/// keeps going; only a failure to write to `out` ends it early.
pub fn run(session: &mut Session, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Type 'help' for a list of commands.")?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {}", err)?;
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        match execute(session, command, out) {
            Ok(()) => {}
            Err(CommandError::Io(err)) => return Err(err),
            Err(err) => writeln!(out, "error: {}", err)?,
        }
    }
    Ok(())
}

fn execute(
    session: &mut Session,
    command: ShellCommand,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match command {
        ShellCommand::Translate { address, radix } => {
            session.translate_one(out, address, radix)?;
        }
        ShellCommand::Random(count) => {
            let translated = session.random(out, count)?;
            writeln!(out, "{} random addresses translated", translated)?;
        }
        ShellCommand::Load(path) => {
            let translated = session.load(out, &path)?;
            writeln!(out, "{}: {} addresses translated", path.display(), translated)?;
        }
        ShellCommand::Policy(policy) => {
            session.engine_mut().set_tlb_policy(policy);
            writeln!(out, "TLB replacement policy: {}", policy)?;
        }
        ShellCommand::Reset => {
            session.engine_mut().reset();
            writeln!(out, "All data cleared")?;
        }
        ShellCommand::Stats => render::statistics(out, &session.engine().statistics())?,
        ShellCommand::Tlb => render::tlb(out, session.engine())?,
        ShellCommand::PageTable => render::page_table(out, session.engine())?,
        ShellCommand::Frames => render::frames(out, session.engine())?,
        ShellCommand::History(n) => render::history(out, session.engine().history().recent(n))?,
        ShellCommand::Export(path) => {
            session.export_to(&path)?;
            writeln!(out, "Statistics exported to {}", path.display())?;
        }
        ShellCommand::Help => writeln!(out, "{}", HELP)?,
        ShellCommand::Quit => {}
    }
    Ok(())
}
