use std::collections::HashMap;

use derivative::Derivative;

use crate::{
    cpu::CpuIo,
    error::ConfigError,
    region::{DeviceHandle, RamRegion, Region, RegionKind, RomRegion},
};

pub const ADDRESS_SPACE: usize = 0x10000;

/// Value returned by reads of addresses no region claims.
pub const UNMAPPED_SENTINEL: u8 = 0x00;

const UNMAPPED: u8 = u8::MAX;

/// The 64K address space, built from fixed non-overlapping regions.
///
/// Word accesses are two byte accesses, high byte first, so device regions
/// see the same sequence a real bus would give them.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MemorySystem {
    regions: Vec<Region>,
    #[derivative(Debug = "ignore")]
    page: Vec<u8>,
    sentinel: u8,
    unmapped_values: HashMap<u16, u8>,
}

impl Default for MemorySystem {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            page: vec![UNMAPPED; ADDRESS_SPACE],
            sentinel: UNMAPPED_SENTINEL,
            unmapped_values: HashMap::new(),
        }
    }
}

impl MemorySystem {
    pub fn builder() -> MemoryMap {
        MemoryMap::default()
    }

    fn region_index(&self, address: u16) -> Option<usize> {
        match self.page[address as usize] {
            UNMAPPED => None,
            index => Some(index as usize),
        }
    }

    fn unmapped_read(&self, address: u16) -> u8 {
        self.unmapped_values
            .get(&address)
            .copied()
            .unwrap_or(self.sentinel)
    }

    pub fn read8(&mut self, address: u16) -> u8 {
        match self.region_index(address) {
            Some(index) => self.regions[index].read(address),
            None => self.unmapped_read(address),
        }
    }

    pub fn write8(&mut self, address: u16, value: u8) {
        if let Some(index) = self.region_index(address) {
            self.regions[index].write(address, value);
        }
    }

    pub fn read16(&mut self, address: u16) -> u16 {
        let high = self.read8(address) as u16;
        let low = self.read8(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    pub fn write16(&mut self, address: u16, value: u16) {
        self.write8(address, (value >> 8) as u8);
        self.write8(address.wrapping_add(1), value as u8);
    }

    /// Reads without triggering device side effects.
    pub fn peek8(&self, address: u16) -> u8 {
        match self.region_index(address) {
            Some(index) => self.regions[index].peek(address),
            None => self.unmapped_read(address),
        }
    }

    pub fn write_block(&mut self, start: u16, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.write8(start.wrapping_add(offset as u16), *byte);
        }
    }

    /// Side-effect-free copy of `start..=end`.
    pub fn dump(&self, start: u16, end: u16) -> Vec<u8> {
        (start..=end).map(|address| self.peek8(address)).collect()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.name == name)
    }

    pub fn region_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.name == name)
    }

    /// Replaces the backing bytes of a RAM region. Returns false when no RAM
    /// region by that name exists or the sizes differ.
    pub fn restore_ram(&mut self, name: &str, data: &[u8]) -> bool {
        match self.region_mut(name).map(|region| &mut region.kind) {
            Some(RegionKind::Ram(ram)) if ram.data.len() == data.len() => {
                ram.data.copy_from_slice(data);
                true
            }
            _ => false,
        }
    }

    /// Replaces the contents of a ROM region, bypassing its write protection.
    pub fn load_rom(&mut self, name: &str, image: &[u8]) -> Result<(), ConfigError> {
        let Some(region) = self.region_mut(name) else {
            return Err(ConfigError::UnknownRom(name.to_string()));
        };
        if image.len() > region.len as usize {
            return Err(ConfigError::RomTooLarge {
                name: region.name.clone(),
                actual: image.len(),
                capacity: region.len,
            });
        }
        match &mut region.kind {
            RegionKind::Rom(rom) => {
                *rom = RomRegion::new(image, region.len);
                Ok(())
            }
            _ => Err(ConfigError::UnknownRom(name.to_string())),
        }
    }

    pub fn clear_ram(&mut self) {
        for region in self.regions.iter_mut() {
            if let RegionKind::Ram(ram) = &mut region.kind {
                ram.data.fill(0x00);
            }
        }
    }
}

impl CpuIo for MemorySystem {
    fn read_byte(&mut self, address: u16) -> u8 {
        self.read8(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.write8(address, value)
    }
}

/// Builder for a [`MemorySystem`]; the topology is fixed once built.
#[derive(Debug, Default)]
pub struct MemoryMap {
    regions: Vec<Region>,
    sentinel: Option<u8>,
    unmapped_values: HashMap<u16, u8>,
    rom_errors: Vec<ConfigError>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ram(&mut self, name: &str, base: u16, len: u32) -> &mut Self {
        self.regions.push(Region::new(
            name,
            base,
            len,
            RegionKind::Ram(RamRegion::new(len)),
        ));
        self
    }

    pub fn rom(&mut self, name: &str, base: u16, len: u32, image: &[u8]) -> &mut Self {
        if image.len() > len as usize {
            self.rom_errors.push(ConfigError::RomTooLarge {
                name: name.to_string(),
                actual: image.len(),
                capacity: len,
            });
        }
        self.regions.push(Region::new(
            name,
            base,
            len,
            RegionKind::Rom(RomRegion::new(image, len)),
        ));
        self
    }

    pub fn rom_region(&mut self, name: &str, base: u16, rom: RomRegion) -> &mut Self {
        let len = rom.data.len() as u32;
        self.regions
            .push(Region::new(name, base, len, RegionKind::Rom(rom)));
        self
    }

    pub fn device(&mut self, name: &str, base: u16, len: u32, device: DeviceHandle) -> &mut Self {
        self.regions
            .push(Region::new(name, base, len, RegionKind::Device(device)));
        self
    }

    pub fn unmapped_sentinel(&mut self, value: u8) -> &mut Self {
        self.sentinel = Some(value);
        self
    }

    /// Overrides the sentinel for a single unmapped address.
    pub fn unmapped_value(&mut self, address: u16, value: u8) -> &mut Self {
        self.unmapped_values.insert(address, value);
        self
    }

    pub fn build(&mut self) -> Result<MemorySystem, ConfigError> {
        if let Some(error) = self.rom_errors.drain(..).next() {
            return Err(error);
        }
        if self.regions.len() >= UNMAPPED as usize {
            return Err(ConfigError::TooManyRegions(self.regions.len()));
        }

        let mut page = vec![UNMAPPED; ADDRESS_SPACE];
        for (index, region) in self.regions.iter().enumerate() {
            if region.len == 0 {
                return Err(ConfigError::EmptyRegion {
                    name: region.name.clone(),
                });
            }
            if region.base as u32 + region.len > ADDRESS_SPACE as u32 {
                return Err(ConfigError::RegionOutOfRange {
                    name: region.name.clone(),
                    base: region.base,
                    len: region.len,
                });
            }
            for address in region.base as u32..=region.end() {
                let slot = &mut page[address as usize];
                if *slot != UNMAPPED {
                    return Err(ConfigError::OverlappingRegions {
                        name: region.name.clone(),
                        other: self.regions[*slot as usize].name.clone(),
                        address: address as u16,
                    });
                }
                *slot = index as u8;
            }
        }

        for region in &self.regions {
            tracing::debug!("[MEM] {}", region);
        }

        Ok(MemorySystem {
            regions: std::mem::take(&mut self.regions),
            page,
            sentinel: self.sentinel.unwrap_or(UNMAPPED_SENTINEL),
            unmapped_values: std::mem::take(&mut self.unmapped_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::region::MappedDevice;

    #[derive(Debug, Default)]
    struct Recorder {
        writes: Vec<(u16, u8)>,
        reads: Vec<u16>,
    }

    impl MappedDevice for Recorder {
        fn read(&mut self, offset: u16) -> u8 {
            self.reads.push(offset);
            offset as u8
        }

        fn write(&mut self, offset: u16, value: u8) {
            self.writes.push((offset, value));
        }

        fn peek(&self, offset: u16) -> u8 {
            offset as u8
        }
    }

    #[test]
    fn test_unmapped_reads_return_sentinel() {
        let mut memory = MemorySystem::builder()
            .ram("ram", 0x0000, 0x100)
            .unmapped_value(0xD000, 0xAA)
            .build()
            .unwrap();

        memory.write8(0x8000, 0x55);

        assert_eq!(memory.read8(0x8000), UNMAPPED_SENTINEL);
        assert_eq!(memory.read8(0xD000), 0xAA);
        assert_eq!(memory.read16(0xCFFF), 0x00AA);
    }

    #[test]
    fn test_word_access_is_big_endian() {
        let mut memory = MemorySystem::builder()
            .ram("ram", 0x0000, 0x100)
            .build()
            .unwrap();

        memory.write16(0x0010, 0xBEEF);

        assert_eq!(memory.read8(0x0010), 0xBE);
        assert_eq!(memory.read8(0x0011), 0xEF);
        assert_eq!(memory.read16(0x0010), 0xBEEF);
    }

    #[test]
    fn test_device_sees_high_byte_first() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut memory = MemorySystem::builder()
            .device("dev", 0xC800, 0x10, recorder.clone())
            .build()
            .unwrap();

        memory.write16(0xC804, 0x1234);
        let value = memory.read16(0xC806);

        assert_eq!(recorder.borrow().writes, vec![(4, 0x12), (5, 0x34)]);
        assert_eq!(recorder.borrow().reads, vec![6, 7]);
        assert_eq!(value, 0x0607);
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let memory = MemorySystem::builder()
            .device("dev", 0xC800, 0x10, recorder.clone())
            .build()
            .unwrap();

        assert_eq!(memory.peek8(0xC803), 3);
        assert!(recorder.borrow().reads.is_empty());
    }

    #[test]
    fn test_overlapping_regions_rejected() {
        let err = MemorySystem::builder()
            .ram("low", 0x0000, 0x4000)
            .ram("high", 0x3FFF, 0x10)
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::OverlappingRegions {
                name: "high".to_string(),
                other: "low".to_string(),
                address: 0x3FFF,
            }
        );
    }

    #[test]
    fn test_zero_length_and_out_of_range_rejected() {
        let err = MemorySystem::builder()
            .ram("empty", 0x1000, 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRegion { .. }));

        let err = MemorySystem::builder()
            .ram("big", 0xF000, 0x2000)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RegionOutOfRange { .. }));
    }

    #[test]
    fn test_oversized_rom_rejected() {
        let err = MemorySystem::builder()
            .rom("rom", 0xE000, 0x10, &[0u8; 0x11])
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::RomTooLarge { actual: 0x11, .. }));
    }

    #[test]
    fn test_load_rom_requires_named_rom_region() {
        let mut memory = MemorySystem::builder()
            .ram("ram", 0x0000, 0x100)
            .rom("rom", 0xE000, 0x10, &[0u8; 0x10])
            .build()
            .unwrap();

        assert_eq!(
            memory.load_rom("bios", &[0x7E]),
            Err(ConfigError::UnknownRom("bios".to_string()))
        );
        assert_eq!(
            memory.load_rom("ram", &[0x7E]),
            Err(ConfigError::UnknownRom("ram".to_string()))
        );
        assert_eq!(memory.read8(0x0000), 0x00);

        memory.load_rom("rom", &[0x7E]).unwrap();
        assert_eq!(memory.read8(0xE000), 0x7E);
    }
}
