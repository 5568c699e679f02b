//! Headless execution for machine-language debugging: run a loaded program
//! until a breakpoint or a limit, then dump memory.

use std::{collections::HashSet, time::Instant};

use thiserror::Error;

use crate::{instruction::Instruction, machine::Machine, memory::MemorySystem};

pub const DEFAULT_WARMUP_CYCLES: u32 = 80_000;
pub const DEFAULT_MAX_CYCLES: i64 = 1_000_000;
/// Stack pointer BASIC's USR() leaves for machine code.
pub const DEFAULT_STACK_POINTER: u16 = 0x0244;
pub const EXECUTION_CHUNK: u64 = 256;

pub const EXIT_OK: i32 = 0;
pub const EXIT_LOAD_FAILED: i32 = 1;
pub const EXIT_CYCLE_LIMIT: i32 = 2;
pub const EXIT_TIME_LIMIT: i32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty hexadecimal value")]
    Empty,

    #[error("invalid hexadecimal value '{0}'")]
    InvalidHex(String),

    #[error("hex value out of range: {0}")]
    OutOfRange(String),

    #[error("range specification must contain ':'")]
    MissingSeparator,

    #[error("range end must be >= start")]
    Reversed,
}

/// Inclusive address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DumpRange {
    pub start: u16,
    pub end: u16,
}

impl DumpRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn full() -> Self {
        Self::new(0x0000, 0xFFFF)
    }
}

pub fn parse_hex(value: &str) -> Result<u16, ParseError> {
    let text = value.trim().to_lowercase();
    let digits = text.strip_prefix("0x").unwrap_or(&text);
    if digits.is_empty() {
        return Err(ParseError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHex(value.to_string()));
    }
    let parsed = u64::from_str_radix(digits, 16)
        .map_err(|_| ParseError::OutOfRange(value.to_string()))?;
    u16::try_from(parsed).map_err(|_| ParseError::OutOfRange(value.to_string()))
}

pub fn parse_range(spec: &str) -> Result<DumpRange, ParseError> {
    let (start, end) = spec.split_once(':').ok_or(ParseError::MissingSeparator)?;
    let start = parse_hex(start)?;
    let end = parse_hex(end)?;
    if end < start {
        return Err(ParseError::Reversed);
    }
    Ok(DumpRange::new(start, end))
}

/// Sorts ranges and joins the ones that overlap or touch. No ranges means
/// the whole address space.
pub fn merge_ranges(ranges: &[DumpRange]) -> Vec<DumpRange> {
    if ranges.is_empty() {
        return vec![DumpRange::full()];
    }

    let mut ordered = ranges.to_vec();
    ordered.sort();

    let mut merged: Vec<DumpRange> = Vec::with_capacity(ordered.len());
    for current in ordered {
        match merged.last_mut() {
            Some(last) if current.start as u32 <= last.end as u32 + 1 => {
                last.end = last.end.max(current.end);
            }
            _ => merged.push(current),
        }
    }
    merged
}

/// Renders ranges as a 16-column table. Rows are aligned to 16 bytes and
/// every range gets its own header.
pub fn format_hex_dump(memory: &MemorySystem, ranges: &[DumpRange]) -> String {
    let header = std::iter::once("ADDR".to_string())
        .chain((0..16).map(|offset| format!("+{:X}", offset)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = Vec::new();
    for (index, range) in ranges.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.push(header.clone());

        let first = (range.start & !0x0F) as u32;
        let last = (range.end | 0x0F) as u32;
        for base in (first..=last).step_by(16) {
            let mut row = format!("{:04X}", base);
            for offset in 0..16 {
                row.push_str(&format!(" {:02X}", memory.peek8((base + offset) as u16)));
            }
            lines.push(row);
        }
    }
    lines.join("\n")
}

/// Raw bytes of each range, concatenated.
pub fn binary_dump(memory: &MemorySystem, ranges: &[DumpRange]) -> Vec<u8> {
    ranges
        .iter()
        .flat_map(|range| memory.dump(range.start, range.end))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    /// `None` runs until a breakpoint or the deadline.
    pub max_cycles: Option<u64>,
    pub breakpoints: HashSet<u16>,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint(u16),
    TimeLimit,
    CycleLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub executed: u64,
    pub reason: StopReason,
}

impl RunOutcome {
    /// Process exit code. A cycle limit only counts as a failure when a limit
    /// was actually requested.
    pub fn exit_code(&self, limit_requested: bool) -> i32 {
        match self.reason {
            StopReason::Breakpoint(_) => EXIT_OK,
            StopReason::TimeLimit => EXIT_TIME_LIMIT,
            StopReason::CycleLimit if limit_requested => EXIT_CYCLE_LIMIT,
            StopReason::CycleLimit => EXIT_OK,
        }
    }
}

/// Executes in chunks of at most [`EXECUTION_CHUNK`] cycles. After every
/// chunk the breakpoints are checked first, then the deadline, then the
/// cycle limit.
pub fn run(machine: &mut Machine, limits: &RunLimits) -> RunOutcome {
    let mut remaining = limits.max_cycles;
    let mut executed_total = 0;

    loop {
        let chunk = remaining.map_or(EXECUTION_CHUNK, |left| left.min(EXECUTION_CHUNK));
        let executed = match machine.tick(chunk as u32) as u64 {
            0 => chunk,
            executed => executed,
        };
        executed_total += executed;
        if let Some(left) = remaining.as_mut() {
            *left = left.saturating_sub(executed);
        }

        let pc = machine.pc();
        let reason = if limits.breakpoints.contains(&pc) {
            Some(StopReason::Breakpoint(pc))
        } else if limits.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(StopReason::TimeLimit)
        } else if remaining == Some(0) {
            Some(StopReason::CycleLimit)
        } else {
            None
        };

        if let Some(reason) = reason {
            let memory = machine.memory();
            let next = Instruction::parse_at(&memory, pc);
            tracing::debug!(
                "[DEBUG] stopped after {} cycles: {:?} at {:04X} {:<8} {}",
                executed_total,
                reason,
                pc,
                next.opcode_with_args(),
                next.name()
            );
            return RunOutcome {
                executed: executed_total,
                reason,
            };
        }
    }
}

/// Powers the machine on and lets the ROM initialize.
pub fn warm_up(machine: &mut Machine, cycles: u32) {
    machine.power_on();
    let mut executed = 0;
    while executed < cycles {
        executed += machine.tick((cycles - executed).min(EXECUTION_CHUNK as u32));
    }
}

/// Resets into the ROM (unless `reset` is false), then points the CPU at
/// `start` with the given stack.
pub fn prepare_cpu(machine: &mut Machine, start: u16, stack_pointer: u16, reset: bool) {
    if reset {
        machine.reset();
        machine.tick(1);
    }
    machine.set_sp(stack_pointer);
    machine.set_pc(start);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> MemorySystem {
        let mut memory = MemorySystem::builder()
            .ram("ram", 0x0000, 0x100)
            .build()
            .unwrap();
        memory.write_block(0x0000, &[0x12, 0x34]);
        memory.write8(0x000F, 0xAB);
        memory.write8(0x0010, 0xCD);
        memory
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x0300"), Ok(0x0300));
        assert_eq!(parse_hex("0300"), Ok(0x0300));
        assert_eq!(parse_hex(" 0XFFFF "), Ok(0xFFFF));

        assert_eq!(parse_hex(""), Err(ParseError::Empty));
        assert!(matches!(parse_hex("0x10000"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(parse_hex("xyz"), Err(ParseError::InvalidHex(_))));
        assert!(matches!(parse_hex("-1"), Err(ParseError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0010:001F"), Ok(DumpRange::new(0x10, 0x1F)));
        assert_eq!(parse_range("0010"), Err(ParseError::MissingSeparator));
        assert_eq!(parse_range("0020:0010"), Err(ParseError::Reversed));
    }

    #[test]
    fn test_merge_ranges() {
        let merged = merge_ranges(&[
            DumpRange::new(0x0010, 0x0015),
            DumpRange::new(0x0000, 0x000F),
            DumpRange::new(0x0100, 0x0100),
        ]);
        assert_eq!(
            merged,
            vec![DumpRange::new(0x0000, 0x0015), DumpRange::new(0x0100, 0x0100)]
        );
        assert_eq!(merge_ranges(&[]), vec![DumpRange::full()]);
        assert_eq!(
            merge_ranges(&[DumpRange::new(0, 0xFFFF), DumpRange::new(0xFFF0, 0xFFFF)]),
            vec![DumpRange::full()]
        );
    }

    #[test]
    fn test_hex_dump_table() {
        let dump = format_hex_dump(&memory(), &[DumpRange::new(0x0000, 0x0010)]);
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(
            lines[0],
            "ADDR +0 +1 +2 +3 +4 +5 +6 +7 +8 +9 +A +B +C +D +E +F"
        );
        assert!(lines[1].starts_with("0000 12 34"));
        assert!(lines[1].ends_with("AB"));
        assert!(lines[2].starts_with("0010 CD 00"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_hex_dump_separates_ranges() {
        let dump = format_hex_dump(
            &memory(),
            &[DumpRange::new(0x0000, 0x0000), DumpRange::new(0x0020, 0x0020)],
        );
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("ADDR"));
    }

    #[test]
    fn test_binary_dump() {
        let bytes = binary_dump(
            &memory(),
            &[DumpRange::new(0x0000, 0x0001), DumpRange::new(0x0010, 0x0010)],
        );
        assert_eq!(bytes, vec![0x12, 0x34, 0xCD]);
    }

    #[test]
    fn test_exit_codes() {
        let outcome = |reason| RunOutcome {
            executed: 0,
            reason,
        };
        assert_eq!(outcome(StopReason::Breakpoint(0)).exit_code(true), EXIT_OK);
        assert_eq!(outcome(StopReason::TimeLimit).exit_code(false), EXIT_TIME_LIMIT);
        assert_eq!(outcome(StopReason::CycleLimit).exit_code(true), EXIT_CYCLE_LIMIT);
        assert_eq!(outcome(StopReason::CycleLimit).exit_code(false), EXIT_OK);
    }
}
