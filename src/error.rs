use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("region {name} has zero length")]
    EmptyRegion { name: String },

    #[error("region {name} at {base:#06X} (len {len:#06X}) extends past 0xFFFF")]
    RegionOutOfRange { name: String, base: u16, len: u32 },

    #[error("region {name} overlaps {other} at {address:#06X}")]
    OverlappingRegions {
        name: String,
        other: String,
        address: u16,
    },

    #[error("ROM image for {name} is {actual} bytes, region holds {capacity}")]
    RomTooLarge {
        name: String,
        actual: usize,
        capacity: u32,
    },

    #[error("no ROM region named {0}")]
    UnknownRom(String),

    #[error("memory map holds {0} regions, at most 254 are supported")]
    TooManyRegions(usize),

    #[error("peripheral {0} is wired more than once")]
    DuplicatePeripheral(String),
}

#[derive(Debug, Error)]
pub enum ProgramLoadError {
    #[error("invalid PROG magic")]
    InvalidMagic,

    #[error("unsupported PROG version: {0}")]
    UnsupportedVersion(u32),

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("{0}")]
    InvalidSection(&'static str),

    #[error("program exceeds PROG limits")]
    ProgramTooLarge,

    #[error("line number missing: {0}")]
    MissingLineNumber(String),

    #[error("invalid line number {number}: {line}")]
    InvalidLineNumber { number: u32, line: String },

    #[error("invalid escape in line: {0}")]
    InvalidEscape(String),

    #[error("line too long: {0}")]
    LineTooLong(String),

    #[error("basic program does not fit in memory")]
    OutOfMemory,

    #[error("unsupported program format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid utf-8 text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot region {name} holds {actual} bytes, machine expects {expected}")]
    RegionSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyboardError {
    #[error("key row {row} bit {bit} is outside the 16x8 matrix")]
    InvalidKey { row: usize, bit: u8 },

    #[error("key matrix must have 16 rows, got {0}")]
    InvalidMatrix(usize),
}
