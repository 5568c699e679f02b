use std::fmt;

use crate::cpu::ConditionCodes;

#[derive(Debug, Eq, PartialEq)]
pub struct InternalState {
    // accumulators
    pub a: u8,
    pub b: u8,

    // 16-bit registers
    pub x: u16,
    pub sp: u16,
    pub pc: u16,

    pub ccr: u8,
    pub opcode: u8,
}

impl fmt::Display for InternalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:04X} #{:02X} - A: #{:02X} B: #{:02X} X: #{:04X} SP: #{:04X} - {}",
            self.pc,
            self.opcode,
            self.a,
            self.b,
            self.x,
            self.sp,
            ConditionCodes::from_byte(self.ccr)
        )
    }
}

pub trait ReportState {
    fn report_state(&mut self) -> anyhow::Result<InternalState>;
}
