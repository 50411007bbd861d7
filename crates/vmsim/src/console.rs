//! Defines the stderr console that backs the `log` facade.

use std::io::{self, Write};

use log::LevelFilter;
use spin::{Mutex, Once};

pub struct Console {
    /// Include file, line and target in every entry.
    detailed: bool,
    stderr: Mutex<io::Stderr>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Installs the console as the global logger.
    ///
    /// `verbosity` 0 logs warnings and errors, 1 adds info and debug, 2 or more adds trace
    /// with detailed entries.
    pub fn init(verbosity: u8) -> &'static Self {
        let console = DEFAULT.call_once(|| Console {
            detailed: verbosity >= 2,
            stderr: Mutex::new(io::stderr()),
        });
        console.install(level_for(verbosity));
        console
    }

    fn install(&'static self, level: LevelFilter) {
        if log::set_logger(self).is_ok() {
            log::set_max_level(level);
        }
    }
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl log::Log for Console {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = self.stderr.lock();
        // Nowhere left to report a failed write to stderr.
        let _ = write_log_entry_to(&mut *stderr, record, self.detailed);
    }

    fn flush(&self) {
        let _ = self.stderr.lock().flush();
    }
}

fn write_log_entry_to(
    writer: &mut impl Write,
    record: &log::Record<'_>,
    detailed: bool,
) -> io::Result<()> {
    if detailed {
        writeln!(
            writer,
            "[{} {}:{} {}] {}",
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.target(),
            record.args()
        )
    } else {
        writeln!(writer, "[{:5}] {}", record.level(), record.args())
    }
}
