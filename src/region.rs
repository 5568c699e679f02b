use std::{
    cell::RefCell,
    fmt::{self, Debug},
    fs::File,
    io::Read,
    path::PathBuf,
    rc::Rc,
};

use serde::{Deserialize, Serialize};

/// A peripheral whose registers are mapped into the address space.
///
/// Offsets are relative to the base of the region the device is mapped at.
pub trait MappedDevice: Debug {
    fn read(&mut self, offset: u16) -> u8;
    fn write(&mut self, offset: u16, value: u8);

    /// Returns what a read would return, without any read side effects.
    fn peek(&self, offset: u16) -> u8;
}

pub type DeviceHandle = Rc<RefCell<dyn MappedDevice>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
    Device,
}

pub enum RegionKind {
    Ram(RamRegion),
    Rom(RomRegion),
    Device(DeviceHandle),
}

impl Debug for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Ram(ram) => write!(f, "Ram({} bytes)", ram.data.len()),
            RegionKind::Rom(rom) => write!(f, "Rom({} bytes, path={:?})", rom.data.len(), rom.path),
            RegionKind::Device(device) => write!(f, "Device({:?})", device.borrow()),
        }
    }
}

#[derive(Debug)]
pub struct Region {
    pub name: String,
    pub base: u16,
    pub len: u32,
    pub kind: RegionKind,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} {:#06X}-{:#06X} {:?}",
            self.name,
            self.base,
            self.end(),
            self.mode()
        )
    }
}

impl Region {
    pub fn new(name: impl Into<String>, base: u16, len: u32, kind: RegionKind) -> Self {
        Self {
            name: name.into(),
            base,
            len,
            kind,
        }
    }

    pub fn end(&self) -> u32 {
        self.base as u32 + self.len.saturating_sub(1)
    }

    pub fn contains(&self, address: u16) -> bool {
        let address = address as u32;
        address >= self.base as u32 && address <= self.end()
    }

    pub fn mode(&self) -> AccessMode {
        match self.kind {
            RegionKind::Ram(_) => AccessMode::ReadWrite,
            RegionKind::Rom(_) => AccessMode::ReadOnly,
            RegionKind::Device(_) => AccessMode::Device,
        }
    }

    fn offset(&self, address: u16) -> u16 {
        address.wrapping_sub(self.base)
    }

    pub fn read(&mut self, address: u16) -> u8 {
        let offset = self.offset(address);
        match &mut self.kind {
            RegionKind::Ram(ram) => ram.read(offset),
            RegionKind::Rom(rom) => rom.read(offset),
            RegionKind::Device(device) => device.borrow_mut().read(offset),
        }
    }

    pub fn write(&mut self, address: u16, value: u8) {
        let offset = self.offset(address);
        match &mut self.kind {
            RegionKind::Ram(ram) => ram.write(offset, value),
            RegionKind::Rom(_) => {
                tracing::trace!(
                    "Attempt to write {:02X} to ROM {} address {:#06X}",
                    value,
                    self.name,
                    address
                );
            }
            RegionKind::Device(device) => device.borrow_mut().write(offset, value),
        }
    }

    pub fn peek(&self, address: u16) -> u8 {
        let offset = self.offset(address);
        match &self.kind {
            RegionKind::Ram(ram) => ram.read(offset),
            RegionKind::Rom(rom) => rom.read(offset),
            RegionKind::Device(device) => device.borrow().peek(offset),
        }
    }

    /// Backing bytes for RAM and ROM regions. Devices have none.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.kind {
            RegionKind::Ram(ram) => Some(&ram.data),
            RegionKind::Rom(rom) => Some(&rom.data),
            RegionKind::Device(_) => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct RamRegion {
    pub data: Vec<u8>,
}

impl RamRegion {
    pub fn new(len: u32) -> Self {
        Self {
            data: vec![0x00; len as usize],
        }
    }

    fn read(&self, offset: u16) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0x00)
    }

    fn write(&mut self, offset: u16, value: u8) {
        if let Some(cell) = self.data.get_mut(offset as usize) {
            *cell = value;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct RomRegion {
    pub path: Option<PathBuf>,
    pub data: Vec<u8>,
}

impl RomRegion {
    /// Builds a ROM of `len` bytes; bytes past the end of `image` read as 0x00.
    pub fn new(image: &[u8], len: u32) -> Self {
        let mut data = vec![0x00; len as usize];
        let count = image.len().min(data.len());
        data[..count].copy_from_slice(&image[..count]);

        Self { path: None, data }
    }

    pub fn load(path: PathBuf, len: u32) -> anyhow::Result<Self> {
        let mut file = File::open(&path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let mut rom = Self::new(&crate::program::rom_payload(&buffer), len);
        rom.path = Some(path);

        Ok(rom)
    }

    fn read(&self, offset: u16) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0x00)
    }
}
