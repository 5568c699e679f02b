pub mod alu;
pub mod bus;
pub mod clock;
pub mod cpu;
pub mod cpu_extensions;
pub mod debug;
pub mod display;
pub mod error;
pub mod instruction;
pub mod internal_state;
pub mod jr100;
pub mod keyboard;
pub mod machine;
pub mod memory;
pub mod program;
pub mod region;
pub mod snapshot;
pub mod sound;
pub mod via;

pub use cpu::{CpuIo, Mb8861};
pub use display::{Font, Renderer};
pub use internal_state::{InternalState, ReportState};
pub use machine::{Machine, MachineBuilder, RunStatus};
pub use memory::MemorySystem;
pub use program::ProgramInfo;
pub use snapshot::Snapshot;
pub use via::Via6522;
use wasm_bindgen::prelude::*;

pub fn get_machine(rom_data: &[u8], extended_ram: bool) -> Result<Machine, error::ConfigError> {
    MachineBuilder::new()
        .basic_rom(rom_data)
        .extended_ram(extended_ram)
        .build()
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen(js_name = Machine)]
pub struct JsMachine(Machine);

#[wasm_bindgen(js_class = Machine)]
impl JsMachine {
    #[wasm_bindgen(constructor)]
    pub fn new(rom_data: &[u8], extended_ram: bool) -> Result<JsMachine, JsValue> {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();

        let mut machine = get_machine(rom_data, extended_ram).map_err(js_error)?;
        machine.power_on();
        Ok(Self(machine))
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.0.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn cycles(&self) -> u64 {
        self.0.clock_count()
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    pub fn pause(&mut self) {
        self.0.pause();
    }

    pub fn resume(&mut self) {
        self.0.resume();
    }

    pub fn tick(&mut self, cycles: u32) -> u32 {
        self.0.tick(cycles)
    }

    #[wasm_bindgen(js_name = stepFrame)]
    pub fn step_frame(&mut self) {
        self.0.step_frame();
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.0.peek8(address)
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.0.write8(address, value);
    }

    pub fn memory(&self, start: u16, end: u16) -> Vec<u8> {
        self.0.dump(start, end)
    }

    pub fn screen(&self) -> Vec<u8> {
        self.0.screen()
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.0.text()
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, row: usize, bit: u8) -> Result<(), JsValue> {
        self.0.press_key(row, bit).map_err(js_error)
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, row: usize, bit: u8) -> Result<(), JsValue> {
        self.0.release_key(row, bit).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setGamepad)]
    pub fn set_gamepad(&mut self, left: bool, right: bool, up: bool, down: bool, switch: bool) {
        self.0.set_gamepad(jr100::GamepadState {
            left,
            right,
            up,
            down,
            switch,
        });
    }

    /// Pending beeper frequency changes as `[timestamp_ns, hz]` pairs. A
    /// frequency of zero marks the line going off.
    #[wasm_bindgen(js_name = takeSoundEvents)]
    pub fn take_sound_events(&mut self) -> Vec<f64> {
        let mut flat = Vec::new();
        let mut last_ts = 0.0;
        for event in self.0.take_sound_events() {
            match event {
                sound::SoundEvent::Frequency { timestamp_ns, hz } => {
                    last_ts = timestamp_ns;
                    flat.extend([timestamp_ns, hz]);
                }
                sound::SoundEvent::LineOff => flat.extend([last_ts, 0.0]),
                sound::SoundEvent::LineOn => {}
            }
        }
        flat
    }

    #[wasm_bindgen(js_name = loadProgram)]
    pub fn load_program(&mut self, name: &str, bytes: &[u8]) -> Result<String, JsValue> {
        let info = self.0.load_program_bytes(name, bytes).map_err(js_error)?;
        Ok(info.name)
    }

    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&self) -> Result<String, JsValue> {
        self.0.export_state().to_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = importState)]
    pub fn import_state(&mut self, json: &str) -> Result<(), JsValue> {
        let snapshot = Snapshot::from_json(json).map_err(js_error)?;
        self.0.import_state(&snapshot).map_err(js_error)
    }
}
