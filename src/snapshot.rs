use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock, cpu::CpuState, display::Display, error::SnapshotError, keyboard::Keyboard,
    machine::RunStatus, program::ProgramInfo, via::ViaState,
};

/// Contents of one RAM region, keyed by region name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamImage {
    pub name: String,
    pub data: Vec<u8>,
}

/// Everything needed to resume a machine where it stopped. ROM contents are
/// not included; the machine restoring a snapshot supplies its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cpu: CpuState,
    pub via: ViaState,
    pub keyboard: Keyboard,
    pub display: Display,
    pub gamepad_status: u8,
    pub ram: Vec<RamImage>,
    pub clock: Clock,
    pub bus_cycles: u64,
    pub irq_line: bool,
    pub status: RunStatus,
    pub program: Option<ProgramInfo>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}
