//! Drives a [`TranslationEngine`] on behalf of the command line and the shell.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use vmm::{AccessRecord, TranslateError, TranslationEngine};

use crate::input::{self, ParseAddressError, Radix};
use crate::render;

/// Errors from a single user command.
#[derive(Debug)]
pub enum CommandError {
    Io(io::Error),
    /// The named file could not be opened or read.
    File { path: PathBuf, source: io::Error },
    Parse(ParseAddressError),
    /// Address outside the virtual space, with the valid range in the user's radix.
    OutOfRange(String),
    /// Malformed command or argument.
    Usage(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::File { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::Parse(err) => write!(f, "{}", err),
            Self::OutOfRange(message) | Self::Usage(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) | Self::File { source: err, .. } => Some(err),
            Self::Parse(err) => Some(err),
            Self::OutOfRange(_) | Self::Usage(_) => None,
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseAddressError> for CommandError {
    fn from(err: ParseAddressError) -> Self {
        Self::Parse(err)
    }
}

pub struct Session {
    engine: TranslationEngine,
    /// Pause between batch translations.
    delay: Option<Duration>,
    rng: StdRng,
}

impl Session {
    /// `seed` makes random batches reproducible.
    pub fn new(engine: TranslationEngine, delay: Option<Duration>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { engine, delay, rng }
    }

    pub fn engine(&self) -> &TranslationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TranslationEngine {
        &mut self.engine
    }

    /// Translates one address and prints its detail panel.
    pub fn translate_one(
        &mut self,
        out: &mut impl Write,
        address: u64,
        radix: Radix,
    ) -> Result<AccessRecord, CommandError> {
        let record = self.engine.translate(address).map_err(|err| match err {
            TranslateError::AddressOutOfRange { limit, .. } => {
                CommandError::OutOfRange(radix.range_message(limit))
            }
        })?;
        render::translation(out, &record)?;
        Ok(record)
    }

    /// Parses and translates each input, printing a detail panel per translation.
    ///
    /// Inputs that do not parse or fall outside the virtual space are reported and skipped.
    /// Only a failure to write to `out` stops early. Returns the number translated.
    pub fn translate_each<S: AsRef<str>>(
        &mut self,
        out: &mut impl Write,
        inputs: &[S],
        radix: Radix,
    ) -> io::Result<usize> {
        let mut translated = 0;
        for text in inputs {
            let text = text.as_ref();
            let result = input::parse_address(text, radix)
                .map_err(CommandError::from)
                .and_then(|address| {
                    if translated > 0 {
                        writeln!(out)?;
                    }
                    self.translate_one(out, address, radix)
                });
            match result {
                Ok(_) => translated += 1,
                Err(CommandError::Io(err)) => return Err(err),
                Err(err) => log::error!("{}: {}", text, err),
            }
        }
        Ok(translated)
    }

    /// Translates every address, printing one history row each. Out-of-range addresses are
    /// skipped with a warning. Returns the number translated.
    pub fn run_batch(&mut self, out: &mut impl Write, addresses: &[u64]) -> io::Result<usize> {
        render::history_header(out)?;
        let mut translated = 0;
        for (index, &address) in addresses.iter().enumerate() {
            if let Some(delay) = self.delay.filter(|_| index > 0) {
                out.flush()?;
                thread::sleep(delay);
            }
            match self.engine.translate(address) {
                Ok(record) => {
                    render::history_row(out, &record)?;
                    translated += 1;
                }
                Err(err) => log::warn!("skipped: {}", err),
            }
        }
        log::info!("batch: {} of {} addresses translated", translated, addresses.len());
        Ok(translated)
    }

    pub fn random(&mut self, out: &mut impl Write, count: u32) -> Result<usize, CommandError> {
        let count = input::check_count(count).map_err(CommandError::Usage)?;
        let limit = self.engine.geometry().virtual_size();
        let addresses = input::random_addresses(&mut self.rng, count, limit);
        Ok(self.run_batch(out, &addresses)?)
    }

    /// Translates the addresses listed in a file.
    pub fn load(&mut self, out: &mut impl Write, path: &Path) -> Result<usize, CommandError> {
        let file_error = |source| CommandError::File {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(file_error)?;
        let addresses = input::read_addresses(BufReader::new(file)).map_err(file_error)?;
        log::info!("{}: {} addresses", path.display(), addresses.len());
        Ok(self.run_batch(out, &addresses)?)
    }

    /// Writes the statistics export to `path`, replacing any existing file.
    pub fn export_to(&self, path: &Path) -> Result<(), CommandError> {
        let file_error = |source| CommandError::File {
            path: path.to_path_buf(),
            source,
        };
        let mut sink = BufWriter::new(File::create(path).map_err(file_error)?);
        self.engine.export(&mut sink).map_err(file_error)?;
        sink.flush().map_err(file_error)
    }
}
