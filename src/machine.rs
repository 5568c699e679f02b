use std::{
    cell::{Ref, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use crate::{
    bus::{Bus, Io},
    clock::{Clock, ClockEvent, REFRESH_RATE},
    cpu::{Mb8861, Registers},
    display::{Display, Font, Renderer},
    error::{ConfigError, KeyboardError, ProgramLoadError, SnapshotError},
    internal_state::{InternalState, ReportState},
    jr100::{self, ExtendedIoPort, GamepadState, Jr100Ports, BASIC_ROM_LENGTH, CPU_CLOCK_HZ},
    keyboard::Keyboard,
    memory::MemorySystem,
    program::{self, ProgramInfo, PROG_MAGIC},
    region::{RegionKind, RomRegion},
    snapshot::{RamImage, Snapshot},
    sound::{Beeper, SoundEvent},
    via::Via6522,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Paused,
    #[default]
    Stopped,
}

/// A JR-100: MB8861 CPU, R6522 VIA, memory map and the devices on the ports.
pub struct Machine {
    pub bus: Bus,
    pub via: Rc<RefCell<Via6522>>,
    pub ext_io: Rc<RefCell<ExtendedIoPort>>,
    pub keyboard: Rc<RefCell<Keyboard>>,
    pub display: Rc<RefCell<Display>>,
    pub beeper: Rc<RefCell<Beeper>>,
    pub clock: Clock,
    pub frame_ready: bool,
    status: RunStatus,
    gamepad: GamepadState,
    program: Option<ProgramInfo>,
    extended_ram: bool,
}

impl Machine {
    pub fn builder() -> MachineBuilder {
        MachineBuilder::new()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn extended_ram(&self) -> bool {
        self.extended_ram
    }

    pub fn cpu(&self) -> &Mb8861<Io> {
        &self.bus.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mb8861<Io> {
        &mut self.bus.cpu
    }

    pub fn registers(&self) -> Registers {
        self.bus.cpu.regs
    }

    pub fn pc(&self) -> u16 {
        self.bus.cpu.pc()
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.bus.cpu.regs.pc = pc;
    }

    pub fn set_sp(&mut self, sp: u16) {
        self.bus.cpu.regs.sp = sp;
    }

    pub fn clock_count(&self) -> u64 {
        self.bus.clock_count()
    }

    // lifecycle

    /// Resets everything and starts running.
    pub fn power_on(&mut self) {
        self.reset();
        self.set_status(RunStatus::Running);
    }

    pub fn power_off(&mut self) {
        self.set_status(RunStatus::Stopped);
    }

    pub fn pause(&mut self) {
        if self.status == RunStatus::Running {
            self.set_status(RunStatus::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.status == RunStatus::Paused {
            self.set_status(RunStatus::Running);
        }
    }

    fn set_status(&mut self, status: RunStatus) {
        if self.status != status {
            tracing::info!("Machine {:?} -> {:?}", self.status, status);
        }
        self.status = status;
    }

    /// Requests a CPU reset and returns the VIA and clocks to power-on state.
    /// The reset vector is fetched on the next tick.
    pub fn reset(&mut self) {
        tracing::info!("Resetting JR-100");
        self.bus.reset();
        self.clock.reset();
        self.frame_ready = false;
    }

    /// Runs the machine for at least `cycles` cycles. Does nothing unless
    /// the machine is running. Returns the cycles actually executed.
    pub fn tick(&mut self, cycles: u32) -> u32 {
        if self.status != RunStatus::Running || cycles == 0 {
            return 0;
        }

        let consumed = self.bus.tick(cycles);
        let events = self.clock.tick(consumed);
        if !events.is_empty() {
            self.handle_clock_events(events);
        }
        consumed
    }

    fn handle_clock_events(&mut self, events: Vec<ClockEvent>) {
        for event in events {
            match event {
                ClockEvent::Refresh => {
                    self.frame_ready = true;
                    tracing::trace!(
                        "Frame {} completed, total cycles: {}",
                        self.clock.frame_count(),
                        self.clock.total_cycles()
                    );
                }
                ClockEvent::GamepadPoll => {
                    self.ext_io.borrow_mut().set_gamepad(self.gamepad);
                }
            }
        }
    }

    /// Runs until the next display refresh.
    pub fn step_frame(&mut self) {
        self.frame_ready = false;
        let frame = self.clock.refresh_interval().min(u32::MAX as u64) as u32;
        let mut executed = 0;
        while !self.frame_ready && executed < frame {
            match self.tick(frame - executed) {
                0 => break,
                cycles => executed += cycles,
            }
        }
    }

    pub fn is_frame_ready(&self) -> bool {
        self.frame_ready
    }

    // memory

    pub fn memory(&self) -> Ref<'_, MemorySystem> {
        self.bus.memory.borrow()
    }

    pub fn read8(&self, address: u16) -> u8 {
        self.bus.read8(address)
    }

    pub fn write8(&self, address: u16, value: u8) {
        self.bus.write8(address, value)
    }

    pub fn read16(&self, address: u16) -> u16 {
        self.bus.memory.borrow_mut().read16(address)
    }

    pub fn write16(&self, address: u16, value: u16) {
        self.bus.memory.borrow_mut().write16(address, value)
    }

    pub fn peek8(&self, address: u16) -> u8 {
        self.bus.peek8(address)
    }

    pub fn dump(&self, start: u16, end: u16) -> Vec<u8> {
        self.memory().dump(start, end)
    }

    pub fn load_basic_rom(&mut self, image: &[u8]) -> Result<(), ConfigError> {
        self.bus
            .memory
            .borrow_mut()
            .load_rom("basic", &program::rom_payload(image))
    }

    // devices

    pub fn press_key(&mut self, row: usize, bit: u8) -> Result<(), KeyboardError> {
        self.keyboard.borrow_mut().press(row, bit)
    }

    pub fn release_key(&mut self, row: usize, bit: u8) -> Result<(), KeyboardError> {
        self.keyboard.borrow_mut().release(row, bit)
    }

    pub fn set_key_matrix(&mut self, rows: &[u8]) -> Result<(), KeyboardError> {
        self.keyboard.borrow_mut().set_matrix(rows)
    }

    /// Latched into the expansion port at the next gamepad poll.
    pub fn set_gamepad(&mut self, state: GamepadState) {
        self.gamepad = state;
    }

    pub fn take_sound_events(&mut self) -> Vec<SoundEvent> {
        self.beeper.borrow_mut().drain_events()
    }

    pub fn font(&self) -> Font {
        self.display.borrow().font
    }

    pub fn text(&self) -> String {
        Renderer::new(&self.memory(), self.font()).as_text()
    }

    pub fn screen(&self) -> Vec<u8> {
        let memory = self.memory();
        let mut renderer = Renderer::new(&memory, self.font());
        renderer.draw();
        renderer.screen_buffer
    }

    // programs

    pub fn program_info(&self) -> Option<&ProgramInfo> {
        self.program.as_ref()
    }

    /// Loads a `.prg`/`.prog`/`.bas` file, then resets the CPU into it.
    pub fn load_program(&mut self, path: &Path) -> Result<ProgramInfo, ProgramLoadError> {
        let info = program::load_program_file(&mut self.bus.memory.borrow_mut(), path)?;
        Ok(self.program_loaded(info))
    }

    /// Loads an in-memory image: a PROG container, or BASIC text otherwise.
    pub fn load_program_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<ProgramInfo, ProgramLoadError> {
        let mut info = {
            let mut memory = self.bus.memory.borrow_mut();
            if bytes.starts_with(PROG_MAGIC) {
                program::load_prog(&mut memory, bytes)?
            } else {
                let text = String::from_utf8(bytes.to_vec())?;
                program::load_basic_text(&mut memory, &text)?
            }
        };
        if info.name.is_empty() {
            info.name = name.to_uppercase();
        }
        Ok(self.program_loaded(info))
    }

    fn program_loaded(&mut self, info: ProgramInfo) -> ProgramInfo {
        tracing::info!("Program {} loaded, {} region(s)", info.name, info.regions.len());
        self.program = Some(info.clone());
        self.bus.cpu.reset();
        self.bus.cpu.step(1);
        info
    }

    // snapshots

    pub fn export_state(&self) -> Snapshot {
        let ram = self
            .memory()
            .regions()
            .iter()
            .filter_map(|region| match &region.kind {
                RegionKind::Ram(ram) => Some(RamImage {
                    name: region.name.clone(),
                    data: ram.data.clone(),
                }),
                _ => None,
            })
            .collect();

        Snapshot {
            cpu: self.bus.cpu.export_state(),
            via: self.via.borrow().export_state(),
            keyboard: self.keyboard.borrow().clone(),
            display: self.display.borrow().clone(),
            gamepad_status: self.ext_io.borrow().gamepad_status,
            ram,
            clock: self.clock.clone(),
            bus_cycles: self.bus.clock_count(),
            irq_line: self.bus.irq_line(),
            status: self.status,
            program: self.program.clone(),
        }
    }

    /// Restores a snapshot. Nothing is changed when a RAM image does not fit
    /// the region of the same name. Images for regions this machine lacks
    /// are skipped.
    pub fn import_state(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        {
            let memory = self.memory();
            for image in &snapshot.ram {
                if let Some(region) = memory.region(&image.name) {
                    if region.len as usize != image.data.len() {
                        return Err(SnapshotError::RegionSizeMismatch {
                            name: image.name.clone(),
                            expected: region.len as usize,
                            actual: image.data.len(),
                        });
                    }
                }
            }
        }

        {
            let mut memory = self.bus.memory.borrow_mut();
            for image in &snapshot.ram {
                if !memory.restore_ram(&image.name, &image.data) {
                    tracing::warn!("Snapshot region {} skipped", image.name);
                }
            }
        }

        self.bus.cpu.import_state(&snapshot.cpu);
        self.via.borrow_mut().import_state(snapshot.via.clone());
        *self.keyboard.borrow_mut() = snapshot.keyboard.clone();
        *self.display.borrow_mut() = snapshot.display.clone();
        self.ext_io.borrow_mut().gamepad_status = snapshot.gamepad_status;
        self.clock = snapshot.clock.clone();
        self.bus.set_clock_count(snapshot.bus_cycles);
        self.bus.set_irq_line(snapshot.irq_line);
        self.status = snapshot.status;
        self.program = snapshot.program.clone();
        tracing::info!("Snapshot restored at PC={:04X}", self.pc());
        Ok(())
    }
}

impl ReportState for Machine {
    fn report_state(&mut self) -> anyhow::Result<InternalState> {
        let regs = self.bus.cpu.regs;
        let opcode = self.bus.memory.try_borrow()?.peek8(regs.pc);
        Ok(InternalState {
            a: regs.a,
            b: regs.b,
            x: regs.x,
            sp: regs.sp,
            pc: regs.pc,
            ccr: regs.cc.to_byte(),
            opcode,
        })
    }
}

#[derive(Debug)]
pub struct MachineBuilder {
    extended_ram: bool,
    rom: Option<RomRegion>,
    rom_size: usize,
    clock_frequency: u32,
    refresh_rate: f64,
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self {
            extended_ram: false,
            rom: None,
            rom_size: 0,
            clock_frequency: CPU_CLOCK_HZ,
            refresh_rate: REFRESH_RATE,
        }
    }
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extended_ram(&mut self, extended: bool) -> &mut Self {
        self.extended_ram = extended;
        self
    }

    /// BASIC ROM contents, raw or wrapped in a PROG header.
    pub fn basic_rom(&mut self, image: &[u8]) -> &mut Self {
        let payload = program::rom_payload(image);
        self.rom_size = payload.len();
        self.rom = Some(RomRegion::new(&payload, BASIC_ROM_LENGTH));
        self
    }

    pub fn rom_file(&mut self, path: impl Into<PathBuf>) -> anyhow::Result<&mut Self> {
        self.rom = Some(RomRegion::load(path.into(), BASIC_ROM_LENGTH)?);
        self.rom_size = 0;
        Ok(self)
    }

    pub fn clock_frequency(&mut self, frequency: u32) -> &mut Self {
        self.clock_frequency = frequency;
        self
    }

    pub fn refresh_rate(&mut self, rate: f64) -> &mut Self {
        self.refresh_rate = rate;
        self
    }

    pub fn build(&self) -> Result<Machine, ConfigError> {
        if self.rom_size > BASIC_ROM_LENGTH as usize {
            return Err(ConfigError::RomTooLarge {
                name: "basic".to_string(),
                actual: self.rom_size,
                capacity: BASIC_ROM_LENGTH,
            });
        }

        let keyboard = Rc::new(RefCell::new(Keyboard::new()));
        let display = Rc::new(RefCell::new(Display::new()));
        let beeper = Rc::new(RefCell::new(Beeper::new()));
        let ports = Jr100Ports::new(
            keyboard.clone(),
            display.clone(),
            beeper.clone(),
            self.clock_frequency,
        );
        let via = Rc::new(RefCell::new(Via6522::with_listener(Box::new(ports))));
        let ext_io = Rc::new(RefCell::new(ExtendedIoPort::new()));

        let rom = self
            .rom
            .clone()
            .unwrap_or_else(|| RomRegion::new(&[], BASIC_ROM_LENGTH));
        let memory = jr100::memory_map(self.extended_ram, rom, via.clone(), ext_io.clone())?;
        tracing::info!("Initializing JR-100 at {} Hz", self.clock_frequency);
        for region in memory.regions() {
            tracing::info!("  {}", region);
        }

        let mut bus = Bus::new(memory);
        bus.attach("via", via.clone())?;
        bus.cpu.reset();
        bus.cpu.step(1);

        Ok(Machine {
            bus,
            via,
            ext_io,
            keyboard,
            display,
            beeper,
            clock: Clock::new(self.clock_frequency, self.refresh_rate),
            frame_ready: false,
            status: RunStatus::Stopped,
            gamepad: GamepadState::default(),
            program: None,
            extended_ram: self.extended_ram,
        })
    }
}
