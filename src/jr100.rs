//! JR-100 wiring: the memory map, the expansion port and the devices hanging
//! off the VIA ports (keyboard, display font select, beeper).

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    display::{Display, Font, USER_CHAR_LENGTH, USER_CHAR_START, VIDEO_RAM_LENGTH, VIDEO_RAM_START},
    error::ConfigError,
    keyboard::Keyboard,
    memory::MemorySystem,
    region::{DeviceHandle, MappedDevice, RomRegion},
    sound::Beeper,
    via::{PortDrive, PortListener, Timer1Mode, TimerLoad, REGISTER_COUNT},
};

pub const CPU_CLOCK_HZ: u32 = 894_000;
/// Crystal the beeper divider is derived from.
pub const SOUND_CLOCK_HZ: f64 = 894_886.25;

pub const MAIN_RAM_STANDARD: u32 = 0x4000;
pub const MAIN_RAM_EXTENDED: u32 = 0x8000;
pub const VIA_START: u16 = 0xC800;
pub const EXT_IO_START: u16 = 0xCC00;
pub const EXT_IO_LENGTH: u32 = 0x0400;
pub const BASIC_ROM_START: u16 = 0xE000;
pub const BASIC_ROM_LENGTH: u32 = 0x2000;

/// Unmapped address that reads back a fixed pattern on real hardware.
pub const PROBE_ADDRESS: u16 = 0xD000;
pub const PROBE_VALUE: u8 = 0xAA;

pub const GAMEPAD_STATUS_OFFSET: u16 = 0x02;

pub mod gamepad {
    pub const RIGHT: u8 = 0x01;
    pub const LEFT: u8 = 0x02;
    pub const UP: u8 = 0x04;
    pub const DOWN: u8 = 0x08;
    pub const SWITCH: u8 = 0x10;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub switch: bool,
}

impl GamepadState {
    pub fn status(&self) -> u8 {
        [
            (self.right, gamepad::RIGHT),
            (self.left, gamepad::LEFT),
            (self.up, gamepad::UP),
            (self.down, gamepad::DOWN),
            (self.switch, gamepad::SWITCH),
        ]
        .iter()
        .filter(|(pressed, _)| *pressed)
        .fold(0, |status, (_, bit)| status | bit)
    }
}

/// The expansion port at 0xCC00. Only the gamepad status byte is decoded.
#[derive(Debug, Default)]
pub struct ExtendedIoPort {
    pub gamepad_status: u8,
}

impl ExtendedIoPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gamepad(&mut self, state: GamepadState) {
        self.gamepad_status = state.status();
    }
}

impl MappedDevice for ExtendedIoPort {
    fn read(&mut self, offset: u16) -> u8 {
        self.peek(offset)
    }

    fn write(&mut self, offset: u16, value: u8) {
        if offset == GAMEPAD_STATUS_OFFSET {
            self.gamepad_status = value;
        }
    }

    fn peek(&self, offset: u16) -> u8 {
        if offset == GAMEPAD_STATUS_OFFSET {
            self.gamepad_status
        } else {
            0x00
        }
    }
}

/// Devices wired to the VIA ports.
///
/// ORA selects a keyboard row whose pressed keys appear on PB0-PB4. PB5
/// selects the font plane. PB7 is jumpered to PB6. Timer 1 in square-wave
/// mode drives the beeper.
#[derive(Debug)]
pub struct Jr100Ports {
    keyboard: Rc<RefCell<Keyboard>>,
    display: Rc<RefCell<Display>>,
    beeper: Rc<RefCell<Beeper>>,
    clock_frequency: u32,
}

impl Jr100Ports {
    pub fn new(
        keyboard: Rc<RefCell<Keyboard>>,
        display: Rc<RefCell<Display>>,
        beeper: Rc<RefCell<Beeper>>,
        clock_frequency: u32,
    ) -> Self {
        Self {
            keyboard,
            display,
            beeper,
            clock_frequency,
        }
    }

    fn jumper_pb7_pb6(port_b: u8) -> PortDrive {
        PortDrive {
            mask: 0x40,
            value: if port_b & 0x80 != 0 { 0x40 } else { 0x00 },
        }
    }

    pub fn beeper_frequency(counter: i32) -> Option<f64> {
        let divisor = counter + 2;
        (divisor > 0).then(|| SOUND_CLOCK_HZ / divisor as f64 / 2.0)
    }
}

impl PortListener for Jr100Ports {
    fn port_a_written(&mut self, ora: u8, _port_b: u8) -> Option<PortDrive> {
        let row = (ora & 0x0F) as usize;
        let keys = self.keyboard.borrow().row(row);
        trace!("[KBD] row {:X} = {:02X}", row, keys);
        Some(PortDrive {
            mask: 0x1F,
            value: !keys & 0x1F,
        })
    }

    fn port_b_written(&mut self, port_b: u8) -> Option<PortDrive> {
        let font = if port_b & 0x20 != 0 {
            Font::UserDefined
        } else {
            Font::Normal
        };
        self.display.borrow_mut().set_font(font);
        Some(Self::jumper_pb7_pb6(port_b))
    }

    fn timer1_loaded(&mut self, load: TimerLoad) {
        let mut beeper = self.beeper.borrow_mut();
        if load.acr & 0xC0 != 0xC0 {
            beeper.line_off();
            return;
        }
        if let Some(hz) = Self::beeper_frequency(load.counter) {
            let timestamp_ns = load.clock as f64 * 1e9 / self.clock_frequency as f64;
            beeper.set_frequency(timestamp_ns, hz);
            beeper.line_on();
        }
    }

    fn timer1_expired(&mut self, mode: Timer1Mode, port_b: u8) -> Option<PortDrive> {
        match mode {
            Timer1Mode::OneShot => {
                self.beeper.borrow_mut().line_off();
                None
            }
            Timer1Mode::OneShotPb7 | Timer1Mode::SquareWave => Some(Self::jumper_pb7_pb6(port_b)),
            Timer1Mode::FreeRun => None,
        }
    }
}

/// Lays out the JR-100 address space around the given devices.
pub fn memory_map(
    extended_ram: bool,
    basic_rom: RomRegion,
    via: DeviceHandle,
    ext_io: DeviceHandle,
) -> Result<MemorySystem, ConfigError> {
    let main_ram = if extended_ram {
        MAIN_RAM_EXTENDED
    } else {
        MAIN_RAM_STANDARD
    };

    MemorySystem::builder()
        .ram("main", 0x0000, main_ram)
        .ram("udc", USER_CHAR_START, USER_CHAR_LENGTH)
        .ram("vram", VIDEO_RAM_START, VIDEO_RAM_LENGTH)
        .device("via", VIA_START, REGISTER_COUNT, via)
        .device("extio", EXT_IO_START, EXT_IO_LENGTH, ext_io)
        .rom_region("basic", BASIC_ROM_START, basic_rom)
        .unmapped_value(PROBE_ADDRESS, PROBE_VALUE)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SoundEvent;

    fn ports() -> (Jr100Ports, Rc<RefCell<Keyboard>>, Rc<RefCell<Beeper>>) {
        let keyboard = Rc::new(RefCell::new(Keyboard::new()));
        let beeper = Rc::new(RefCell::new(Beeper::new()));
        let ports = Jr100Ports::new(
            keyboard.clone(),
            Rc::new(RefCell::new(Display::new())),
            beeper.clone(),
            CPU_CLOCK_HZ,
        );
        (ports, keyboard, beeper)
    }

    #[test]
    fn test_gamepad_status_bits() {
        let state = GamepadState {
            right: true,
            up: true,
            switch: true,
            ..Default::default()
        };
        assert_eq!(state.status(), 0x15);
    }

    #[test]
    fn test_extended_io_only_decodes_status() {
        let mut port = ExtendedIoPort::new();
        port.set_gamepad(GamepadState {
            left: true,
            ..Default::default()
        });
        assert_eq!(port.read(0x02), 0x02);
        assert_eq!(port.read(0x03), 0x00);

        port.write(0x05, 0xFF);
        assert_eq!(port.read(0x05), 0x00);
        port.write(0x02, 0x08);
        assert_eq!(port.peek(0x02), 0x08);
    }

    #[test]
    fn test_row_select_drives_pressed_keys() {
        let (mut ports, keyboard, _) = ports();
        keyboard.borrow_mut().press(3, 1).unwrap();
        keyboard.borrow_mut().press(3, 4).unwrap();

        let drive = ports.port_a_written(0xF3, 0x00).unwrap();
        assert_eq!(drive, PortDrive { mask: 0x1F, value: 0x12 });

        let drive = ports.port_a_written(0x02, 0x00).unwrap();
        assert_eq!(drive.value, 0x00);
    }

    #[test]
    fn test_square_wave_load_starts_tone() {
        let (mut ports, _, beeper) = ports();
        let load = TimerLoad {
            acr: 0xC0,
            counter: 0x100,
            clock: 0,
        };
        ports.timer1_loaded(load);
        ports.timer1_loaded(load);

        let events = beeper.borrow_mut().drain_events();
        assert_eq!(events.len(), 2);
        match events[0] {
            SoundEvent::Frequency { hz, .. } => {
                assert!((hz - SOUND_CLOCK_HZ / 258.0 / 2.0).abs() < 1e-9)
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1], SoundEvent::LineOn);

        ports.timer1_loaded(TimerLoad { acr: 0x40, ..load });
        assert_eq!(beeper.borrow_mut().drain_events(), vec![SoundEvent::LineOff]);
    }

    #[test]
    fn test_jumper_follows_pb7() {
        let (mut ports, _, _) = ports();
        assert_eq!(
            ports.timer1_expired(Timer1Mode::SquareWave, 0x80),
            Some(PortDrive { mask: 0x40, value: 0x40 })
        );
        assert_eq!(
            ports.port_b_written(0x20),
            Some(PortDrive { mask: 0x40, value: 0x00 })
        );
        assert_eq!(ports.timer1_expired(Timer1Mode::FreeRun, 0x80), None);
    }
}
