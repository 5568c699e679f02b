use std::{cell::RefCell, fmt::Debug, rc::Rc};

use crate::{
    cpu::{CpuIo, Mb8861},
    error::ConfigError,
    memory::MemorySystem,
};

/// A device advanced by the bus after every CPU instruction.
pub trait Peripheral: Debug {
    fn tick(&mut self, cycles: u32);

    /// Interrupt request output, active high.
    fn irq_line(&self) -> bool {
        false
    }

    fn reset(&mut self) {}
}

pub type PeripheralHandle = Rc<RefCell<dyn Peripheral>>;

/// The CPU's view of the address space.
pub struct Io {
    pub memory: Rc<RefCell<MemorySystem>>,
}

impl Io {
    pub fn new(memory: Rc<RefCell<MemorySystem>>) -> Self {
        Self { memory }
    }
}

impl CpuIo for Io {
    fn read_byte(&mut self, address: u16) -> u8 {
        self.memory.borrow_mut().read8(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.memory.borrow_mut().write8(address, value)
    }
}

/// Owns the CPU and the devices it shares the address space with.
///
/// Each CPU decision is followed by handing the cycles it used to every
/// peripheral in attach order, then sampling the combined interrupt line.
/// A rising edge latches an IRQ into the CPU.
#[derive(Debug)]
pub struct Bus {
    pub memory: Rc<RefCell<MemorySystem>>,
    pub cpu: Mb8861<Io>,
    peripherals: Vec<(String, PeripheralHandle)>,
    irq_line: bool,
    clock_count: u64,
}

impl Bus {
    pub fn new(memory: MemorySystem) -> Self {
        let memory = Rc::new(RefCell::new(memory));
        let cpu = Mb8861::new(Io::new(memory.clone()));
        Self {
            memory,
            cpu,
            peripherals: Vec::new(),
            irq_line: false,
            clock_count: 0,
        }
    }

    pub fn attach(&mut self, name: &str, peripheral: PeripheralHandle) -> Result<(), ConfigError> {
        let duplicate = self
            .peripherals
            .iter()
            .any(|(other, handle)| other == name || Rc::ptr_eq(handle, &peripheral));
        if duplicate {
            return Err(ConfigError::DuplicatePeripheral(name.to_string()));
        }
        self.peripherals.push((name.to_string(), peripheral));
        Ok(())
    }

    pub fn peripheral_names(&self) -> impl Iterator<Item = &str> {
        self.peripherals.iter().map(|(name, _)| name.as_str())
    }

    /// Runs the CPU for at least `cycles` and returns the cycles consumed.
    ///
    /// Peripherals advance after every instruction, so an interrupt
    /// acknowledged by a handler is seen as a falling edge no matter how
    /// large the budget is.
    pub fn tick(&mut self, cycles: u32) -> u32 {
        let mut consumed = 0;
        while consumed < cycles {
            let used = self.cpu.execute_next();
            for (_, peripheral) in &self.peripherals {
                peripheral.borrow_mut().tick(used);
            }
            self.clock_count += used as u64;
            self.sample_irq();
            consumed += used;
        }
        consumed
    }

    fn sample_irq(&mut self) {
        let line = self
            .peripherals
            .iter()
            .any(|(_, peripheral)| peripheral.borrow().irq_line());
        if line && !self.irq_line {
            tracing::trace!("[BUS] IRQ edge at cycle {}", self.clock_count);
            self.cpu.signal_irq();
        }
        self.irq_line = line;
    }

    /// Requests a CPU reset and returns every peripheral to power-on state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        for (_, peripheral) in &self.peripherals {
            peripheral.borrow_mut().reset();
        }
        self.irq_line = false;
        self.clock_count = 0;
    }

    pub fn irq_line(&self) -> bool {
        self.irq_line
    }

    /// Restores the sampled interrupt line, so a pending edge is not replayed.
    pub fn set_irq_line(&mut self, line: bool) {
        self.irq_line = line;
    }

    pub fn clock_count(&self) -> u64 {
        self.clock_count
    }

    pub fn set_clock_count(&mut self, clock_count: u64) {
        self.clock_count = clock_count;
    }

    pub fn read8(&self, address: u16) -> u8 {
        self.memory.borrow_mut().read8(address)
    }

    pub fn write8(&self, address: u16, value: u8) {
        self.memory.borrow_mut().write8(address, value)
    }

    pub fn peek8(&self, address: u16) -> u8 {
        self.memory.borrow().peek8(address)
    }
}
