//! R6522 versatile interface adapter: two ports, two timers, a shift
//! register and the interrupt flag/enable pair.
//!
//! Register side effects are expressed as [`FlagUpdate`]s returned by the
//! per-register handlers and applied in one place, so read-clears-flag rules
//! can be audited register by register. External devices hang off the ports
//! through a [`PortListener`]; they never get a handle on the chip itself.

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::{bus::Peripheral, region::MappedDevice};

pub mod reg {
    pub const IORB: u16 = 0x00;
    pub const IORA: u16 = 0x01;
    pub const DDRB: u16 = 0x02;
    pub const DDRA: u16 = 0x03;
    pub const T1CL: u16 = 0x04;
    pub const T1CH: u16 = 0x05;
    pub const T1LL: u16 = 0x06;
    pub const T1LH: u16 = 0x07;
    pub const T2CL: u16 = 0x08;
    pub const T2CH: u16 = 0x09;
    pub const SR: u16 = 0x0A;
    pub const ACR: u16 = 0x0B;
    pub const PCR: u16 = 0x0C;
    pub const IFR: u16 = 0x0D;
    pub const IER: u16 = 0x0E;
    pub const IORA_NO_HANDSHAKE: u16 = 0x0F;
}

pub mod ifr {
    pub const CA2: u8 = 0x01;
    pub const CA1: u8 = 0x02;
    pub const SR: u8 = 0x04;
    pub const CB2: u8 = 0x08;
    pub const CB1: u8 = 0x10;
    pub const T2: u8 = 0x20;
    pub const T1: u8 = 0x40;
    pub const IRQ: u8 = 0x80;
}

pub const REGISTER_COUNT: u32 = 0x10;

/// Interrupt flag bits a register access sets and clears.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlagUpdate {
    pub set: u8,
    pub clear: u8,
}

impl FlagUpdate {
    pub const NONE: FlagUpdate = FlagUpdate { set: 0, clear: 0 };

    pub fn clear(bits: u8) -> Self {
        Self { set: 0, clear: bits }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRead {
    pub value: u8,
    pub flags: FlagUpdate,
}

/// Bits an external device drives onto port B. Bits configured as outputs
/// in DDRB are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDrive {
    pub mask: u8,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timer1Mode {
    OneShot,
    FreeRun,
    OneShotPb7,
    SquareWave,
}

impl Timer1Mode {
    pub fn from_acr(acr: u8) -> Self {
        match acr & 0xC0 {
            0x00 => Timer1Mode::OneShot,
            0x40 => Timer1Mode::FreeRun,
            0x80 => Timer1Mode::OneShotPb7,
            _ => Timer1Mode::SquareWave,
        }
    }
}

/// Timer 1 state at the moment its counter was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerLoad {
    pub acr: u8,
    pub counter: i32,
    pub clock: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    Ca2,
    Cb1,
    Cb2,
}

/// Callbacks for the devices wired to the chip's ports.
pub trait PortListener: std::fmt::Debug {
    /// ORA written through the handshaking register. `port_b` is the current
    /// port B input value.
    fn port_a_written(&mut self, _ora: u8, _port_b: u8) -> Option<PortDrive> {
        None
    }

    /// Port A output changed while at least one bit is an output.
    fn port_a_output(&mut self, _ora: u8) {}

    /// ORB written; `port_b` is the resulting port B input value.
    fn port_b_written(&mut self, _port_b: u8) -> Option<PortDrive> {
        None
    }

    fn timer1_loaded(&mut self, _load: TimerLoad) {}

    fn timer1_expired(&mut self, _mode: Timer1Mode, _port_b: u8) -> Option<PortDrive> {
        None
    }

    fn control_line(&mut self, _line: ControlLine, _high: bool) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaState {
    pub ifr: u8,
    pub ier: u8,
    pub pcr: u8,
    pub acr: u8,
    pub ira: u8,
    pub ora: u8,
    pub ddra: u8,
    pub irb: u8,
    pub orb: u8,
    pub ddrb: u8,
    pub sr: u8,
    pub port_a: u8,
    pub port_b: u8,
    pub ca1_in: bool,
    pub ca2_in: bool,
    pub ca2_out: bool,
    pub ca2_timer: i32,
    pub cb1_in: bool,
    pub cb1_out: bool,
    pub cb2_in: bool,
    pub cb2_out: bool,
    pub previous_pb6: u8,
    pub latch1: u16,
    pub latch2: u16,
    pub timer1: i32,
    pub timer2: i32,
    pub shift_tick: bool,
    pub shift_counter: u8,
    pub shift_started: bool,
    pub timer1_initialized: bool,
    pub timer1_enable: bool,
    pub timer2_initialized: bool,
    pub timer2_enable: bool,
    pub clock: u64,
}

impl Default for ViaState {
    fn default() -> Self {
        Self {
            ifr: 0,
            ier: 0,
            pcr: 0,
            acr: 0,
            ira: 0,
            ora: 0,
            ddra: 0,
            irb: 0,
            orb: 0,
            ddrb: 0,
            sr: 0,
            port_a: 0,
            port_b: 0,
            ca1_in: false,
            ca2_in: false,
            ca2_out: false,
            ca2_timer: -1,
            cb1_in: false,
            cb1_out: false,
            cb2_in: false,
            cb2_out: false,
            previous_pb6: 0,
            latch1: 0,
            latch2: 0,
            timer1: 0,
            timer2: 0,
            shift_tick: false,
            shift_counter: 0,
            shift_started: false,
            timer1_initialized: false,
            timer1_enable: false,
            timer2_initialized: false,
            timer2_enable: false,
            clock: 0,
        }
    }
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct Via6522 {
    pub state: ViaState,
    #[derivative(Debug = "ignore")]
    listener: Option<Box<dyn PortListener>>,
}

impl Via6522 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(listener: Box<dyn PortListener>) -> Self {
        Self {
            state: ViaState::default(),
            listener: Some(listener),
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn PortListener>) {
        self.listener = Some(listener);
    }

    pub fn reset(&mut self) {
        self.state = ViaState::default();
    }

    /// Logical OR of every enabled interrupt source.
    pub fn irq_line(&self) -> bool {
        self.state.ier & self.state.ifr & 0x7F != 0
    }

    pub fn export_state(&self) -> ViaState {
        self.state.clone()
    }

    pub fn import_state(&mut self, state: ViaState) {
        self.state = state;
    }

    // interrupt flags

    fn process_irq(&mut self) {
        if self.irq_line() {
            if self.state.ifr & ifr::IRQ == 0 {
                self.state.ifr |= ifr::IRQ;
                tracing::trace!("[VIA] IRQ asserted, IFR={:02X}", self.state.ifr);
            }
        } else if self.state.ifr & ifr::IRQ != 0 {
            self.state.ifr &= !ifr::IRQ;
            tracing::trace!("[VIA] IRQ released");
        }
    }

    fn set_interrupt(&mut self, bits: u8) {
        if self.state.ifr & bits == 0 {
            self.state.ifr |= bits;
            self.process_irq();
        }
    }

    fn clear_interrupt(&mut self, bits: u8) {
        if self.state.ifr & bits != 0 {
            self.state.ifr &= !bits;
            self.process_irq();
        }
    }

    fn apply(&mut self, flags: FlagUpdate) {
        if flags.clear != 0 {
            self.clear_interrupt(flags.clear);
        }
        if flags.set != 0 {
            self.set_interrupt(flags.set);
        }
    }

    // ports

    pub fn input_port_a(&self) -> u8 {
        (self.state.ira & !self.state.ddra) | (self.state.port_a & self.state.ddra)
    }

    pub fn input_port_b(&self) -> u8 {
        (self.state.irb & !self.state.ddrb) | (self.state.orb & self.state.ddrb)
    }

    pub fn input_port_b_bit(&self, bit: u8) -> bool {
        self.input_port_b() & (1 << bit) != 0
    }

    fn latch_port_a(&mut self) {
        if self.state.acr & 0x01 == 0 {
            self.state.ira = self.state.port_a;
        }
    }

    fn latch_port_b(&mut self) {
        if self.state.acr & 0x02 == 0 {
            self.state.irb = self.state.port_b;
        }
    }

    /// Drives an external line onto an input bit of port A.
    pub fn set_port_a(&mut self, bit: u8, high: bool) {
        let mask = 1 << bit;
        if self.state.ddra & mask != 0 {
            return;
        }
        if high {
            self.state.port_a |= mask;
        } else {
            self.state.port_a &= !mask;
        }
        self.latch_port_a();
    }

    pub fn set_port_a_value(&mut self, value: u8) {
        self.state.port_a = (self.state.port_a & self.state.ddra) | (value & !self.state.ddra);
        self.latch_port_a();
    }

    /// Drives an external line onto an input bit of port B.
    pub fn set_port_b(&mut self, bit: u8, high: bool) {
        let mask = 1 << bit;
        if self.state.ddrb & mask != 0 {
            return;
        }
        if high {
            self.state.port_b |= mask;
        } else {
            self.state.port_b &= !mask;
        }
        self.latch_port_b();
    }

    pub fn set_port_b_value(&mut self, value: u8) {
        self.state.port_b = (self.state.port_b & self.state.ddrb) | (value & !self.state.ddrb);
        self.latch_port_b();
    }

    fn invert_port_b(&mut self, bit: u8) {
        let high = self.state.port_b & (1 << bit) == 0;
        self.set_port_b(bit, high);
    }

    fn drive_port_b(&mut self, drive: Option<PortDrive>) {
        if let Some(drive) = drive {
            let keep = self.state.ddrb | !drive.mask;
            self.state.port_b = (self.state.port_b & keep) | (drive.value & !keep);
            self.latch_port_b();
        }
    }

    fn notify_control(&mut self, line: ControlLine, high: bool) {
        if let Some(listener) = self.listener.as_mut() {
            listener.control_line(line, high);
        }
    }

    // control lines

    pub fn set_ca1(&mut self, high: bool) {
        if self.state.ca1_in == high {
            return;
        }
        self.state.ca1_in = high;
        let positive = self.state.pcr & 0x01 == 0x01;
        if high == positive {
            if self.state.acr & 0x01 == 0x01 {
                self.state.ira = self.input_port_a();
            }
            self.set_interrupt(ifr::CA1);
            if !self.state.ca2_out && self.state.pcr & 0x0E == 0x08 {
                self.state.ca2_out = true;
                self.notify_control(ControlLine::Ca2, true);
            }
        }
    }

    pub fn set_ca2(&mut self, high: bool) {
        if self.state.ca2_in == high {
            return;
        }
        self.state.ca2_in = high;
        if self.state.pcr & 0x08 == 0x00 {
            let positive = self.state.pcr & 0x0C == 0x04;
            if high == positive {
                self.set_interrupt(ifr::CA2);
            }
        }
    }

    pub fn set_cb1(&mut self, high: bool) {
        if self.state.cb1_in == high {
            return;
        }
        self.state.cb1_in = high;
        let positive = self.state.pcr & 0x10 == 0x10;
        if high == positive {
            if self.state.acr & 0x02 == 0x02 {
                self.state.irb = self.input_port_b();
            }
            if self.state.shift_started && self.state.acr & 0x1C == 0x0C {
                self.shift_in();
            }
            if self.state.shift_started && self.state.acr & 0x1C == 0x1C {
                self.shift_out();
            }
            self.set_interrupt(ifr::CB1);
            if !self.state.cb2_out && self.state.pcr & 0xA0 == 0x20 {
                self.state.cb2_out = true;
                self.notify_control(ControlLine::Cb2, true);
            }
        }
    }

    pub fn set_cb2(&mut self, high: bool) {
        if self.state.cb2_in == high {
            return;
        }
        self.state.cb2_in = high;
        if self.state.pcr & 0x80 == 0x00 {
            let positive = self.state.pcr & 0xC0 == 0x40;
            if high == positive {
                self.set_interrupt(ifr::CB2);
            }
        }
    }

    // shift register

    fn start_shift(&mut self) {
        match self.state.acr & 0x1C {
            0x04 | 0x08 | 0x0C => self.initialize_shift(true),
            0x10 | 0x14 | 0x18 | 0x1C => self.initialize_shift(false),
            _ => {}
        }
    }

    fn initialize_shift(&mut self, shift_in: bool) {
        self.state.shift_tick = false;
        self.state.shift_counter = 0;
        if self.state.ifr & ifr::SR != 0 {
            self.clear_interrupt(ifr::SR);
            if shift_in {
                self.shift_in();
            } else {
                self.shift_out();
            }
        }
        self.state.shift_started = true;
    }

    fn shift_in(&mut self) {
        if !self.state.shift_started {
            return;
        }
        if self.state.shift_tick {
            self.state.cb1_out = true;
            self.notify_control(ControlLine::Cb1, true);
            self.state.sr = (self.state.sr << 1) | self.state.cb2_in as u8;
            self.state.shift_counter = (self.state.shift_counter + 1) % 8;
            if self.state.shift_counter == 0 {
                self.set_interrupt(ifr::SR);
                self.state.shift_started = false;
            }
        } else {
            self.state.cb1_out = false;
            self.notify_control(ControlLine::Cb1, false);
        }
        self.state.shift_tick = !self.state.shift_tick;
    }

    fn shift_out(&mut self) {
        if !self.state.shift_started {
            return;
        }
        if self.state.shift_tick {
            self.state.cb1_out = true;
            self.notify_control(ControlLine::Cb1, true);
            self.state.cb2_out = self.state.sr & 0x80 != 0;
            self.notify_control(ControlLine::Cb2, self.state.cb2_out);
            self.state.sr = (self.state.sr << 1) | self.state.cb2_out as u8;
            // free-running output never stops on its own
            if self.state.acr & 0x1C != 0x10 {
                self.state.shift_counter = (self.state.shift_counter + 1) % 8;
                if self.state.shift_counter == 0 {
                    self.set_interrupt(ifr::SR);
                    self.state.shift_started = false;
                }
            }
        } else {
            self.state.cb1_out = false;
            self.notify_control(ControlLine::Cb1, false);
        }
        self.state.shift_tick = !self.state.shift_tick;
    }

    // register file

    fn port_a_read_value(&self) -> u8 {
        if self.state.acr & 0x01 == 0 {
            self.input_port_a()
        } else {
            self.state.ira
        }
    }

    fn port_b_read_value(&self) -> u8 {
        if self.state.acr & 0x02 == 0 {
            self.input_port_b()
        } else {
            self.state.irb
        }
    }

    fn cb_flags(&self) -> u8 {
        ifr::CB1 | if self.state.pcr & 0xA0 == 0x20 { 0 } else { ifr::CB2 }
    }

    fn ca_flags(&self) -> u8 {
        ifr::CA1 | if self.state.pcr & 0x0A == 0x02 { 0 } else { ifr::CA2 }
    }

    /// Value a read of `register` would return right now.
    pub fn register_value(&self, register: u16) -> u8 {
        let state = &self.state;
        match register & 0x0F {
            reg::IORB => self.port_b_read_value(),
            reg::IORA | reg::IORA_NO_HANDSHAKE => self.port_a_read_value(),
            reg::DDRB => state.ddrb,
            reg::DDRA => state.ddra,
            reg::T1CL => state.timer1 as u8,
            reg::T1CH => (state.timer1 >> 8) as u8,
            reg::T1LL => state.latch1 as u8,
            reg::T1LH => (state.latch1 >> 8) as u8,
            reg::T2CL => state.timer2 as u8,
            reg::T2CH => (state.timer2 >> 8) as u8,
            reg::SR => state.sr,
            reg::ACR => state.acr,
            reg::PCR => state.pcr,
            reg::IFR => state.ifr,
            _ => state.ier | 0x80,
        }
    }

    fn read_handler(&mut self, register: u16) -> RegisterRead {
        let flags = match register {
            reg::IORB => FlagUpdate::clear(self.cb_flags()),
            reg::IORA => {
                let flags = FlagUpdate::clear(self.ca_flags());
                let handshake = self.state.pcr & 0x0E;
                if self.state.ca2_out && (handshake == 0x0A || handshake == 0x08) {
                    self.state.ca2_out = false;
                    self.notify_control(ControlLine::Ca2, false);
                    if handshake == 0x08 {
                        self.state.ca2_timer = 1;
                    }
                }
                flags
            }
            reg::T1CL => FlagUpdate::clear(ifr::T1),
            reg::T2CL => FlagUpdate::clear(ifr::T2),
            reg::SR => {
                self.start_shift();
                FlagUpdate::NONE
            }
            _ => FlagUpdate::NONE,
        };

        RegisterRead {
            value: self.register_value(register),
            flags,
        }
    }

    fn write_handler(&mut self, register: u16, value: u8) -> FlagUpdate {
        match register {
            reg::IORB => {
                self.state.orb = value;
                let port_b = self.input_port_b();
                let flags = FlagUpdate::clear(self.cb_flags());
                if self.state.cb2_out && self.state.pcr & 0xC0 == 0x80 {
                    self.state.cb2_out = false;
                    self.notify_control(ControlLine::Cb2, false);
                }
                let drive = self
                    .listener
                    .as_mut()
                    .and_then(|listener| listener.port_b_written(port_b));
                self.drive_port_b(drive);
                flags
            }
            reg::IORA => {
                self.write_ora(value);
                let flags = FlagUpdate::clear(self.ca_flags());
                if self.state.ca2_out
                    && (self.state.pcr & 0x0E == 0x0A || self.state.pcr & 0x0C == 0x08)
                {
                    self.state.ca2_out = false;
                    self.notify_control(ControlLine::Ca2, false);
                }
                if self.state.pcr & 0x0E == 0x0A {
                    self.state.ca2_timer = 1;
                }
                let port_b = self.input_port_b();
                let drive = self
                    .listener
                    .as_mut()
                    .and_then(|listener| listener.port_a_written(value, port_b));
                self.drive_port_b(drive);
                flags
            }
            reg::IORA_NO_HANDSHAKE => {
                self.write_ora(value);
                FlagUpdate::NONE
            }
            reg::DDRB => {
                self.state.ddrb = value;
                FlagUpdate::NONE
            }
            reg::DDRA => {
                self.state.ddra = value;
                FlagUpdate::NONE
            }
            reg::T1CL | reg::T1LL => {
                self.state.latch1 = (self.state.latch1 & 0xFF00) | value as u16;
                FlagUpdate::NONE
            }
            reg::T1LH => {
                self.state.latch1 = (self.state.latch1 & 0x00FF) | (value as u16) << 8;
                FlagUpdate::NONE
            }
            reg::T1CH => {
                self.state.latch1 = (self.state.latch1 & 0x00FF) | (value as u16) << 8;
                self.state.timer1 = self.state.latch1 as i32;
                self.state.timer1_initialized = true;
                self.state.timer1_enable = true;
                self.set_port_b(7, false);
                self.timer1_loaded();
                // writing the counter high byte rearms the timer
                FlagUpdate::clear(ifr::T1)
            }
            reg::T2CL => {
                self.state.latch2 = (self.state.latch2 & 0xFF00) | value as u16;
                FlagUpdate::NONE
            }
            reg::T2CH => {
                self.state.latch2 = (self.state.latch2 & 0x00FF) | (value as u16) << 8;
                self.state.timer2 = self.state.latch2 as i32;
                self.state.timer2_initialized = true;
                self.state.timer2_enable = true;
                FlagUpdate::clear(ifr::T2)
            }
            reg::SR => {
                self.start_shift();
                self.state.sr = value;
                FlagUpdate::NONE
            }
            reg::ACR => {
                self.state.acr = value;
                FlagUpdate::NONE
            }
            reg::PCR => {
                self.state.pcr = value;
                FlagUpdate::NONE
            }
            reg::IFR => FlagUpdate::clear(if value & 0x80 != 0 { 0x7F } else { value }),
            _ => {
                if value & 0x80 != 0 {
                    self.state.ier |= value & 0x7F;
                } else {
                    self.state.ier &= !(value & 0x7F);
                }
                self.process_irq();
                FlagUpdate::NONE
            }
        }
    }

    fn write_ora(&mut self, value: u8) {
        self.state.ora = value;
        if self.state.ddra != 0x00 {
            if let Some(listener) = self.listener.as_mut() {
                listener.port_a_output(value);
            }
        }
    }

    fn timer1_loaded(&mut self) {
        let load = TimerLoad {
            acr: self.state.acr,
            counter: self.state.timer1,
            clock: self.state.clock,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener.timer1_loaded(load);
        }
    }

    pub fn register_read(&mut self, register: u16) -> u8 {
        let read = self.read_handler(register & 0x0F);
        self.apply(read.flags);
        tracing::trace!("[VIA] [RD] {:X} = {:02X}", register & 0x0F, read.value);
        read.value
    }

    pub fn register_write(&mut self, register: u16, value: u8) {
        tracing::trace!("[VIA] [WR] {:X} = {:02X}", register & 0x0F, value);
        let flags = self.write_handler(register & 0x0F, value);
        self.apply(flags);
    }

    // countdown

    /// Advances the chip by `cycles` clock cycles.
    pub fn tick(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.tick_once();
        }
    }

    fn tick_once(&mut self) {
        if self.state.ca2_timer >= 0 {
            self.state.ca2_timer -= 1;
            if self.state.ca2_timer < 0 {
                self.state.ca2_out = true;
                self.notify_control(ControlLine::Ca2, true);
            }
        }

        self.tick_timer1();
        self.tick_timer2();

        match self.state.acr & 0x1C {
            0x08 => self.shift_in(),
            0x18 => self.shift_out(),
            _ => {}
        }

        self.state.clock += 1;
    }

    fn tick_timer1(&mut self) {
        if self.state.timer1_initialized {
            self.state.timer1_initialized = false;
            return;
        }
        if self.state.timer1 >= 0 {
            self.state.timer1 -= 1;
            return;
        }

        if self.state.timer1_enable {
            self.set_interrupt(ifr::T1);
            let mode = Timer1Mode::from_acr(self.state.acr);
            match mode {
                Timer1Mode::OneShot => self.state.timer1_enable = false,
                Timer1Mode::FreeRun | Timer1Mode::SquareWave => self.invert_port_b(7),
                Timer1Mode::OneShotPb7 => {
                    self.state.timer1_enable = false;
                    self.set_port_b(7, true);
                }
            }
            tracing::trace!("[VIA] T1 underflow ({:?})", mode);

            let port_b = self.input_port_b();
            let drive = self
                .listener
                .as_mut()
                .and_then(|listener| listener.timer1_expired(mode, port_b));
            self.drive_port_b(drive);
        }
        self.state.timer1 = self.state.latch1 as i32;
        self.timer1_loaded();
    }

    fn tick_timer2(&mut self) {
        let pb6 = self.input_port_b() & 0x40;
        let pb6_falling = self.state.previous_pb6 != 0 && pb6 == 0;
        self.state.previous_pb6 = pb6;

        if self.state.timer2 >= 0 {
            let counting = self.state.acr & 0x20 == 0x00 || pb6_falling;
            if self.state.timer2_initialized {
                self.state.timer2_initialized = false;
            } else if counting {
                self.state.timer2 -= 1;
            }
            return;
        }

        if self.state.timer2_enable {
            self.set_interrupt(ifr::T2);
            self.state.timer2_enable = false;
        }
        if self.state.shift_started && self.state.timer2 & 0xFF == 0xFF {
            match self.state.acr & 0x1C {
                0x04 => self.shift_in(),
                0x10 | 0x14 => self.shift_out(),
                _ => {}
            }
        }
        self.state.timer2 = self.state.latch2 as i32;
    }
}

impl MappedDevice for Via6522 {
    fn read(&mut self, offset: u16) -> u8 {
        self.register_read(offset)
    }

    fn write(&mut self, offset: u16, value: u8) {
        self.register_write(offset, value)
    }

    fn peek(&self, offset: u16) -> u8 {
        self.register_value(offset)
    }
}

impl Peripheral for Via6522 {
    fn tick(&mut self, cycles: u32) {
        Via6522::tick(self, cycles)
    }

    fn irq_line(&self) -> bool {
        Via6522::irq_line(self)
    }

    fn reset(&mut self) {
        Via6522::reset(self)
    }
}
