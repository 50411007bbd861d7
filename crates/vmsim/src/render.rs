//! Text panels for translations, the TLB, the page table and statistics.

use std::io::{self, Write};

use vmm::{
    AccessRecord, ExhaustionPolicy, HumanSize, Statistics, Timestamp, TranslationEngine,
};

/// Page-table rows shown by [`page_table`].
pub const RECENT_PAGE_TABLE_ENTRIES: usize = 20;

/// Frame rows shown by [`frames`].
pub const RECENT_FRAMES: usize = 20;

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(40))
}

pub fn translation(out: &mut impl Write, record: &AccessRecord) -> io::Result<()> {
    writeln!(
        out,
        "Virtual Address:  {} (0x{:08X})",
        record.virtual_address, record.virtual_address
    )?;
    writeln!(out, "  Page Number:    {}", record.page)?;
    writeln!(out, "  Offset:         {}", record.offset)?;
    writeln!(out)?;
    writeln!(out, "TLB:              {}", record.tlb_label())?;
    writeln!(
        out,
        "Page Table:       {}",
        if record.page_fault() {
            "MISS (Page Fault)"
        } else {
            "HIT"
        }
    )?;
    writeln!(out)?;
    if record.fallback {
        writeln!(out, "Frame Number:     {} (fallback)", record.frame)?;
    } else {
        writeln!(out, "Frame Number:     {}", record.frame)?;
    }
    writeln!(
        out,
        "Physical Address: {} (0x{:08X})",
        record.physical_address, record.physical_address
    )
}

/// TLB entries in eviction order, next victim first.
pub fn tlb(out: &mut impl Write, engine: &TranslationEngine) -> io::Result<()> {
    let tlb = engine.tlb();
    writeln!(
        out,
        "TLB Entries ({}/{}) - Policy: {}",
        tlb.len(),
        tlb.capacity(),
        tlb.policy()
    )?;
    rule(out)?;
    writeln!(out, "{:<15} {:<15}", "Page", "Frame")?;
    rule(out)?;
    for entry in tlb.entries() {
        writeln!(out, "{:<15} {:<15}", entry.page, entry.frame)?;
    }
    Ok(())
}

/// The most recently created page-table mappings, oldest of them first.
pub fn page_table(out: &mut impl Write, engine: &TranslationEngine) -> io::Result<()> {
    let table = engine.page_table();
    writeln!(out, "Page Table Entries ({} total)", table.len())?;
    rule(out)?;
    writeln!(out, "{:<15} {:<15}", "Page", "Frame")?;
    rule(out)?;
    let skip = table.len().saturating_sub(RECENT_PAGE_TABLE_ENTRIES);
    for entry in table.entries().skip(skip) {
        writeln!(out, "{:<15} {:<15}", entry.page, entry.frame)?;
    }
    Ok(())
}

/// Highest-numbered handed-out frames and the page each currently holds.
pub fn frames(out: &mut impl Write, engine: &TranslationEngine) -> io::Result<()> {
    let frames = engine.frames();
    let residents = frames.residents();
    writeln!(
        out,
        "Physical Frames ({} in use, {} free of {}) - Exhaustion: {}",
        residents.len(),
        frames.free_frames(),
        frames.total_frames(),
        frames.policy().name()
    )?;
    rule(out)?;
    writeln!(out, "{:<15} {:<15}", "Frame", "Page")?;
    rule(out)?;
    let skip = residents.len().saturating_sub(RECENT_FRAMES);
    for (frame, page) in residents.skip(skip) {
        writeln!(out, "{:<15} {:<15}", frame, page)?;
    }
    Ok(())
}

pub fn statistics(out: &mut impl Write, stats: &Statistics) -> io::Result<()> {
    let counters = &stats.counters;
    writeln!(out, "Total Accesses:   {}", counters.total_accesses)?;
    writeln!(out, "TLB Hits:         {}", counters.tlb_hits)?;
    writeln!(out, "TLB Misses:       {}", counters.tlb_misses)?;
    writeln!(out, "TLB Hit Rate:     {:.2}%", stats.hit_rate() * 100.0)?;
    writeln!(out, "Page Faults:      {}", counters.page_faults)?;
    writeln!(out, "Page Fault Rate:  {:.2}%", stats.fault_rate() * 100.0)?;
    writeln!(
        out,
        "TLB Size:         {}/{}",
        stats.tlb_entries, stats.tlb_capacity
    )?;
    writeln!(out, "Pages in Memory:  {}", stats.page_table_entries)?;
    if counters.fallback_allocations > 0 {
        writeln!(
            out,
            "Fallbacks:        {} (physical memory exhausted)",
            counters.fallback_allocations
        )?;
    }
    Ok(())
}

/// Memory geometry summary printed once per run.
pub fn configuration(out: &mut impl Write, engine: &TranslationEngine) -> io::Result<()> {
    let geometry = engine.geometry();
    writeln!(
        out,
        "Virtual: {} ({} pages)  Physical: {} ({} frames)  Page: {}  TLB: {} entries, {}",
        HumanSize(geometry.virtual_size()),
        geometry.num_pages(),
        HumanSize(geometry.physical_size()),
        geometry.num_frames(),
        HumanSize(geometry.page_size()),
        engine.tlb().capacity(),
        engine.tlb_policy()
    )
}

const HISTORY_COLUMNS: [&str; 8] = [
    "Time",
    "Virtual Addr",
    "Page",
    "Offset",
    "Physical Addr",
    "Frame",
    "TLB",
    "Status",
];

pub fn history_header(out: &mut impl Write) -> io::Result<()> {
    let [time, virt, page, offset, phys, frame, tlb, status] = HISTORY_COLUMNS;
    writeln!(
        out,
        "{:<10} {:<15} {:<10} {:<10} {:<15} {:<10} {:<10} {}",
        time, virt, page, offset, phys, frame, tlb, status
    )
}

pub fn history_row(out: &mut impl Write, record: &AccessRecord) -> io::Result<()> {
    writeln!(
        out,
        "{:<10} {:<15} {:<10} {:<10} {:<15} {:<10} {:<10} {}",
        Timestamp(record.timestamp),
        record.virtual_address,
        record.page,
        record.offset,
        record.physical_address,
        record.frame,
        record.tlb_label(),
        record.outcome
    )
}

/// Tabular access history, one row per record.
pub fn history<'a>(
    out: &mut impl Write,
    records: impl IntoIterator<Item = &'a AccessRecord>,
) -> io::Result<()> {
    history_header(out)?;
    for record in records {
        history_row(out, record)?;
    }
    Ok(())
}
