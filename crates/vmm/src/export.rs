//! Plain-text statistics export.

use std::io::{self, Write};
use std::time::{Duration, SystemTime};

use crate::{AccessRecord, ExhaustionPolicy, TranslationEngine};

const TITLE: &str = "MemFlow - Virtual Memory Manager Statistics";

impl<P: ExhaustionPolicy> TranslationEngine<P> {
    /// Writes a statistics summary followed by one line per access record.
    pub fn export<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        let stats = self.statistics();
        let counters = &stats.counters;

        writeln!(sink, "{}", TITLE)?;
        writeln!(sink, "{}", "=".repeat(50))?;
        writeln!(sink)?;
        writeln!(sink, "Total Memory Accesses: {}", counters.total_accesses)?;
        writeln!(sink, "TLB Hits: {}", counters.tlb_hits)?;
        writeln!(sink, "TLB Misses: {}", counters.tlb_misses)?;
        writeln!(sink, "TLB Hit Rate: {:.2}%", counters.hit_rate() * 100.0)?;
        writeln!(sink, "Page Faults: {}", counters.page_faults)?;
        writeln!(sink, "Page Fault Rate: {:.2}%", counters.fault_rate() * 100.0)?;
        writeln!(sink, "Fallback Allocations: {}", counters.fallback_allocations)?;
        writeln!(sink, "TLB Size: {}/{}", stats.tlb_entries, stats.tlb_capacity)?;
        writeln!(sink, "Pages in Memory: {}", stats.page_table_entries)?;
        writeln!(sink, "TLB Replacement Policy: {}", stats.tlb_policy)?;
        writeln!(sink)?;
        writeln!(sink, "Access History:")?;
        writeln!(sink, "{}", "-".repeat(100))?;

        for record in self.history() {
            write_record(sink, record)?;
        }

        log::info!(
            "exported statistics and {} history records",
            self.history().len()
        );
        Ok(())
    }
}

fn write_record<W: Write + ?Sized>(sink: &mut W, record: &AccessRecord) -> io::Result<()> {
    writeln!(
        sink,
        "{} | Virtual: {} | Page: {} | Frame: {} | {}",
        WallClock(record.wall_clock),
        record.virtual_address,
        record.page,
        record.frame,
        record.outcome
    )
}

/// Renders an elapsed time as seconds with millisecond precision, e.g. `12.034s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub Duration);

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = format!("{}.{:03}s", self.0.as_secs(), self.0.subsec_millis());
        f.pad(&text)
    }
}

/// Renders a wall-clock instant as UTC time of day, e.g. `14:03:27.512`.
///
/// Instants before the Unix epoch render as `00:00:00.000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock(pub SystemTime);

impl core::fmt::Display for WallClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let since_epoch = self
            .0
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let seconds = since_epoch.as_secs() % 86_400;
        let text = format!(
            "{:02}:{:02}:{:02}.{:03}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60,
            since_epoch.subsec_millis()
        );
        f.pad(&text)
    }
}
