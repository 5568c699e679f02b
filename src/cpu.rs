use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    alu,
    cpu_extensions::{self, BitOperand},
    instruction::{self, Acc, AddressingMode, AluOp, ModifyOp, OpcodeDef, Operation},
};

pub const RESET_VECTOR: u16 = 0xFFFE;
pub const NMI_VECTOR: u16 = 0xFFFC;
pub const SWI_VECTOR: u16 = 0xFFFA;
pub const IRQ_VECTOR: u16 = 0xFFF8;

pub const RESET_CYCLES: u32 = 3;
pub const INTERRUPT_CYCLES: u32 = 12;
pub const HALT_CYCLES: u32 = 1;
pub const WAIT_CYCLES: u32 = 1;
pub const UNDEFINED_OPCODE_CYCLES: u32 = 1;

/// Memory as seen from the CPU. Words are big-endian, high byte first.
pub trait CpuIo {
    fn read_byte(&mut self, address: u16) -> u8;
    fn write_byte(&mut self, address: u16, value: u8);

    fn read_word(&mut self, address: u16) -> u16 {
        let high = self.read_byte(address) as u16;
        let low = self.read_byte(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    fn write_word(&mut self, address: u16, value: u16) {
        self.write_byte(address, (value >> 8) as u8);
        self.write_byte(address.wrapping_add(1), value as u8);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCodes {
    pub h: bool,
    pub i: bool,
    pub n: bool,
    pub z: bool,
    pub v: bool,
    pub c: bool,
}

impl ConditionCodes {
    /// Packs the flags as the CCR byte; the two unused top bits read as 1.
    pub fn to_byte(&self) -> u8 {
        0xC0 | (self.h as u8) << 5
            | (self.i as u8) << 4
            | (self.n as u8) << 3
            | (self.z as u8) << 2
            | (self.v as u8) << 1
            | self.c as u8
    }

    pub fn from_byte(value: u8) -> Self {
        Self {
            h: value & 0x20 != 0,
            i: value & 0x10 != 0,
            n: value & 0x08 != 0,
            z: value & 0x04 != 0,
            v: value & 0x02 != 0,
            c: value & 0x01 != 0,
        }
    }

    pub fn set_nz(&mut self, value: u8) {
        self.n = value & 0x80 != 0;
        self.z = value == 0;
    }

    pub fn set_nz16(&mut self, value: u16) {
        self.n = value & 0x8000 != 0;
        self.z = value == 0;
    }
}

impl fmt::Display for ConditionCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, name: char| if set { name } else { '-' };
        write!(
            f,
            "{}{}{}{}{}{}",
            flag(self.h, 'H'),
            flag(self.i, 'I'),
            flag(self.n, 'N'),
            flag(self.z, 'Z'),
            flag(self.v, 'V'),
            flag(self.c, 'C'),
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub x: u16,
    pub sp: u16,
    pub pc: u16,
    pub cc: ConditionCodes,
}

/// Latched interrupt and control inputs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub reset: bool,
    pub nmi: bool,
    pub irq: bool,
    pub halt: bool,
}

/// What the CPU did with its most recent decision.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecState {
    #[default]
    Running,
    Halted,
    WaitingForInterrupt,
    ServicingReset,
    ServicingNmi,
    ServicingIrq,
}

/// Everything needed to resume the CPU exactly where it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub registers: Registers,
    pub signals: Signals,
    pub parked: bool,
    pub state: ExecState,
    pub cycles: u64,
}

/// Fujitsu MB8861: a 6800 core with ADX, NIM, OIM, XIM and TMM.
pub struct Mb8861<T: CpuIo> {
    pub io: T,
    pub regs: Registers,
    pub signals: Signals,
    /// Set by WAI; registers are already stacked while parked.
    pub parked: bool,
    state: ExecState,
    cycles: u64,
}

impl<T: CpuIo> fmt::Debug for Mb8861<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mb8861")
            .field("a", &self.regs.a)
            .field("b", &self.regs.b)
            .field("x", &self.regs.x)
            .field("sp", &self.regs.sp)
            .field("pc", &self.regs.pc)
            .field("cc", &self.regs.cc.to_string())
            .field("signals", &self.signals)
            .field("parked", &self.parked)
            .field("state", &self.state)
            .finish()
    }
}

impl<T: CpuIo> Mb8861<T> {
    pub fn new(io: T) -> Self {
        Self {
            io,
            regs: Registers::default(),
            signals: Signals::default(),
            parked: false,
            state: ExecState::Running,
            cycles: 0,
        }
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Cycles consumed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn halted(&self) -> bool {
        self.signals.halt
    }

    /// Requests a reset; it is serviced at the next step.
    pub fn reset(&mut self) {
        self.signals.reset = true;
    }

    pub fn signal_nmi(&mut self) {
        self.signals.nmi = true;
    }

    pub fn signal_irq(&mut self) {
        self.signals.irq = true;
    }

    pub fn signal_halt(&mut self, asserted: bool) {
        self.signals.halt = asserted;
    }

    pub fn export_state(&self) -> CpuState {
        CpuState {
            registers: self.regs,
            signals: self.signals,
            parked: self.parked,
            state: self.state,
            cycles: self.cycles,
        }
    }

    pub fn import_state(&mut self, state: &CpuState) {
        self.regs = state.registers;
        self.signals = state.signals;
        self.parked = state.parked;
        self.state = state.state;
        self.cycles = state.cycles;
    }

    /// Picks what the next step does, without touching any state.
    pub fn next_state(&self) -> ExecState {
        if self.signals.reset {
            ExecState::ServicingReset
        } else if self.signals.halt {
            ExecState::Halted
        } else if self.signals.nmi {
            ExecState::ServicingNmi
        } else if self.signals.irq && !self.regs.cc.i {
            ExecState::ServicingIrq
        } else if self.parked {
            ExecState::WaitingForInterrupt
        } else {
            ExecState::Running
        }
    }

    /// Runs whole instructions until at least `max_cycles` have been consumed.
    ///
    /// The last instruction may overshoot the budget; the actual count is
    /// returned so callers can carry the difference.
    pub fn step(&mut self, max_cycles: u32) -> u32 {
        let mut consumed = 0;
        while consumed < max_cycles {
            consumed += self.execute_next();
        }
        consumed
    }

    /// Performs one decision: a service routine, an idle cycle or one instruction.
    pub fn execute_next(&mut self) -> u32 {
        self.state = self.next_state();

        let cycles = match self.state {
            ExecState::ServicingReset => self.service_reset(),
            ExecState::Halted => HALT_CYCLES,
            ExecState::ServicingNmi => {
                self.signals.nmi = false;
                self.service_interrupt(NMI_VECTOR)
            }
            ExecState::ServicingIrq => {
                self.signals.irq = false;
                self.service_interrupt(IRQ_VECTOR)
            }
            ExecState::WaitingForInterrupt => WAIT_CYCLES,
            ExecState::Running => self.execute_instruction(),
        };

        self.cycles += cycles as u64;
        cycles
    }

    fn service_reset(&mut self) -> u32 {
        self.regs = Registers {
            cc: ConditionCodes {
                i: true,
                ..Default::default()
            },
            ..Default::default()
        };
        self.signals = Signals::default();
        self.parked = false;
        self.regs.pc = self.io.read_word(RESET_VECTOR);

        tracing::debug!("[CPU] reset, PC={:04X}", self.regs.pc);
        RESET_CYCLES
    }
}

impl<T: CpuIo> Mb8861<T> {
    fn service_interrupt(&mut self, vector: u16) -> u32 {
        if self.parked {
            self.parked = false;
        } else {
            self.push_all();
        }
        self.regs.cc.i = true;
        self.regs.pc = self.io.read_word(vector);

        tracing::trace!("[CPU] interrupt via {:04X} -> {:04X}", vector, self.regs.pc);
        INTERRUPT_CYCLES
    }

    fn fetch8(&mut self) -> u8 {
        let value = self.io.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch16(&mut self) -> u16 {
        let value = self.io.read_word(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(2);
        value
    }

    fn push8(&mut self, value: u8) {
        self.io.write_byte(self.regs.sp, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    fn pull8(&mut self) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        self.io.read_byte(self.regs.sp)
    }

    fn push16(&mut self, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        self.io.write_word(self.regs.sp.wrapping_add(1), value);
    }

    fn pull16(&mut self) -> u16 {
        let value = self.io.read_word(self.regs.sp.wrapping_add(1));
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Stacks PC, X, A, B and CCR, leaving SP seven bytes lower.
    fn push_all(&mut self) {
        let sp = self.regs.sp;
        self.io.write_word(sp.wrapping_sub(1), self.regs.pc);
        self.io.write_word(sp.wrapping_sub(3), self.regs.x);
        self.io.write_byte(sp.wrapping_sub(4), self.regs.a);
        self.io.write_byte(sp.wrapping_sub(5), self.regs.b);
        self.io.write_byte(sp.wrapping_sub(6), self.regs.cc.to_byte());
        self.regs.sp = sp.wrapping_sub(7);
    }

    fn pull_all(&mut self) {
        let sp = self.regs.sp;
        self.regs.cc = ConditionCodes::from_byte(self.io.read_byte(sp.wrapping_add(1)));
        self.regs.b = self.io.read_byte(sp.wrapping_add(2));
        self.regs.a = self.io.read_byte(sp.wrapping_add(3));
        self.regs.x = self.io.read_word(sp.wrapping_add(4));
        self.regs.pc = self.io.read_word(sp.wrapping_add(6));
        self.regs.sp = sp.wrapping_add(7);
    }

    fn effective_address(&mut self, mode: AddressingMode) -> u16 {
        match mode {
            AddressingMode::Direct => self.fetch8() as u16,
            AddressingMode::Indexed => self.regs.x.wrapping_add(self.fetch8() as u16),
            AddressingMode::Extended => self.fetch16(),
            _ => self.regs.pc,
        }
    }

    /// Indexed JMP and JSR go through a pointer stored at X+offset.
    fn jump_target(&mut self, mode: AddressingMode) -> u16 {
        match mode {
            AddressingMode::Indexed => {
                let pointer = self.effective_address(mode);
                self.io.read_word(pointer)
            }
            mode => self.effective_address(mode),
        }
    }

    fn operand8(&mut self, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::Immediate => self.fetch8(),
            _ => {
                let address = self.effective_address(mode);
                self.io.read_byte(address)
            }
        }
    }

    fn operand16(&mut self, mode: AddressingMode) -> u16 {
        match mode {
            AddressingMode::Immediate => self.fetch16(),
            _ => {
                let address = self.effective_address(mode);
                self.io.read_word(address)
            }
        }
    }

    fn accumulator(&self, acc: Acc) -> u8 {
        match acc {
            Acc::A => self.regs.a,
            Acc::B => self.regs.b,
        }
    }

    fn set_accumulator(&mut self, acc: Acc, value: u8) {
        match acc {
            Acc::A => self.regs.a = value,
            Acc::B => self.regs.b = value,
        }
    }

    fn execute_instruction(&mut self) -> u32 {
        let pc = self.regs.pc;
        let opcode = self.fetch8();

        let Some(def) = instruction::decode(opcode) else {
            tracing::trace!("[CPU] undefined opcode {:02X} at {:04X}", opcode, pc);
            return UNDEFINED_OPCODE_CYCLES;
        };

        tracing::trace!("[CPU] {:04X} {}", pc, def.mnemonic);
        self.execute(def);
        def.cycles
    }

    fn execute(&mut self, def: &OpcodeDef) {
        match def.operation {
            Operation::Alu(op, acc) => {
                let operand = self.operand8(def.mode);
                let value = self.accumulator(acc);
                let cc = &mut self.regs.cc;
                let result = match op {
                    AluOp::Add => Some(alu::add(cc, value, operand, false)),
                    AluOp::Adc => {
                        let carry = cc.c;
                        Some(alu::add(cc, value, operand, carry))
                    }
                    AluOp::Sub => Some(alu::sub(cc, value, operand, false)),
                    AluOp::Sbc => {
                        let borrow = cc.c;
                        Some(alu::sub(cc, value, operand, borrow))
                    }
                    AluOp::Cmp => {
                        alu::sub(cc, value, operand, false);
                        None
                    }
                    AluOp::And => Some(alu::logic(cc, value & operand)),
                    AluOp::Bit => {
                        alu::logic(cc, value & operand);
                        None
                    }
                    AluOp::Eor => Some(alu::logic(cc, value ^ operand)),
                    AluOp::Ora => Some(alu::logic(cc, value | operand)),
                    AluOp::Lda => Some(alu::logic(cc, operand)),
                };
                if let Some(result) = result {
                    self.set_accumulator(acc, result);
                }
            }
            Operation::Store(acc) => {
                let address = self.effective_address(def.mode);
                let value = self.accumulator(acc);
                alu::logic(&mut self.regs.cc, value);
                self.io.write_byte(address, value);
            }
            Operation::Modify(op) => self.modify(op, def.mode),

            Operation::Ldx => {
                let value = self.operand16(def.mode);
                alu::load16(&mut self.regs.cc, value);
                self.regs.x = value;
            }
            Operation::Lds => {
                let value = self.operand16(def.mode);
                alu::load16(&mut self.regs.cc, value);
                self.regs.sp = value;
            }
            Operation::Stx => {
                let address = self.effective_address(def.mode);
                alu::load16(&mut self.regs.cc, self.regs.x);
                self.io.write_word(address, self.regs.x);
            }
            Operation::Sts => {
                // N and Z come from X on this part, not from SP.
                let address = self.effective_address(def.mode);
                alu::load16(&mut self.regs.cc, self.regs.x);
                self.io.write_word(address, self.regs.sp);
            }
            Operation::Cpx => {
                let operand = self.operand16(def.mode);
                alu::cpx(&mut self.regs.cc, self.regs.x, operand);
            }
            Operation::Adx => {
                let operand = match def.mode {
                    AddressingMode::Immediate => self.fetch8() as u16,
                    mode => self.operand16(mode),
                };
                self.regs.x = cpu_extensions::adx(&mut self.regs.cc, self.regs.x, operand);
            }

            Operation::Jmp => {
                self.regs.pc = self.jump_target(def.mode);
            }
            Operation::Jsr => {
                let target = self.jump_target(def.mode);
                self.push16(self.regs.pc);
                self.regs.pc = target;
            }
            Operation::Bsr => {
                let offset = self.fetch8() as i8 as u16;
                self.push16(self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(offset);
            }
            Operation::Branch(condition) => {
                let offset = self.fetch8() as i8 as u16;
                if alu::branch_taken(&self.regs.cc, condition) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset);
                }
            }
            Operation::Rts => {
                self.regs.pc = self.pull16();
            }
            Operation::Rti => self.pull_all(),
            Operation::Swi => {
                // The stacked return address skips the byte after the opcode.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.push_all();
                self.regs.cc.i = true;
                self.regs.pc = self.io.read_word(SWI_VECTOR);
            }
            Operation::Wai => {
                self.push_all();
                self.parked = true;
            }

            Operation::Nop => {}
            Operation::Tap => self.regs.cc = ConditionCodes::from_byte(self.regs.a),
            Operation::Tpa => self.regs.a = self.regs.cc.to_byte(),
            Operation::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.cc.z = self.regs.x == 0;
            }
            Operation::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.cc.z = self.regs.x == 0;
            }
            Operation::Ins => self.regs.sp = self.regs.sp.wrapping_add(1),
            Operation::Des => self.regs.sp = self.regs.sp.wrapping_sub(1),
            Operation::Tsx => self.regs.x = self.regs.sp.wrapping_add(1),
            Operation::Txs => self.regs.sp = self.regs.x.wrapping_sub(1),
            Operation::Clv => self.regs.cc.v = false,
            Operation::Sev => self.regs.cc.v = true,
            Operation::Clc => self.regs.cc.c = false,
            Operation::Sec => self.regs.cc.c = true,
            Operation::Cli => self.regs.cc.i = false,
            Operation::Sei => self.regs.cc.i = true,
            Operation::Sba => {
                let Registers { a, b, cc, .. } = &mut self.regs;
                *a = alu::sub(cc, *a, *b, false);
            }
            Operation::Cba => {
                let Registers { a, b, cc, .. } = &mut self.regs;
                alu::sub(cc, *a, *b, false);
            }
            Operation::Aba => {
                let Registers { a, b, cc, .. } = &mut self.regs;
                *a = alu::add(cc, *a, *b, false);
            }
            Operation::Tab => self.regs.b = alu::logic(&mut self.regs.cc, self.regs.a),
            Operation::Tba => self.regs.a = alu::logic(&mut self.regs.cc, self.regs.b),
            Operation::Daa => self.regs.a = alu::daa(&mut self.regs.cc, self.regs.a),
            Operation::Push(acc) => {
                let value = self.accumulator(acc);
                self.push8(value);
            }
            Operation::Pull(acc) => {
                let value = self.pull8();
                self.set_accumulator(acc, value);
            }

            Operation::Nim | Operation::Oim | Operation::Xim | Operation::Tmm => {
                self.bit_operation(def.operation)
            }
        }
    }

    fn modify(&mut self, op: ModifyOp, mode: AddressingMode) {
        let address = match mode {
            AddressingMode::AccumulatorA | AddressingMode::AccumulatorB => None,
            mode => Some(self.effective_address(mode)),
        };
        let value = match address {
            Some(address) => self.io.read_byte(address),
            None if mode == AddressingMode::AccumulatorB => self.regs.b,
            None => self.regs.a,
        };

        let cc = &mut self.regs.cc;
        let result = match op {
            ModifyOp::Neg => alu::neg(cc, value),
            ModifyOp::Com => alu::com(cc, value),
            ModifyOp::Lsr => alu::lsr(cc, value),
            ModifyOp::Ror => alu::ror(cc, value),
            ModifyOp::Asr => alu::asr(cc, value),
            ModifyOp::Asl => alu::asl(cc, value),
            ModifyOp::Rol => alu::rol(cc, value),
            ModifyOp::Dec => alu::dec(cc, value),
            ModifyOp::Inc => alu::inc(cc, value),
            ModifyOp::Clr => alu::clr(cc),
            ModifyOp::Tst => {
                alu::tst(cc, value);
                return;
            }
        };

        match address {
            Some(address) => self.io.write_byte(address, result),
            None if mode == AddressingMode::AccumulatorB => self.regs.b = result,
            None => self.regs.a = result,
        }
    }

    fn bit_operation(&mut self, operation: Operation) {
        let operand = BitOperand {
            mask: self.fetch8(),
            offset: self.fetch8(),
        };
        let address = operand.address(self.regs.x);
        let value = self.io.read_byte(address);
        let cc = &mut self.regs.cc;

        let result = match operation {
            Operation::Nim => cpu_extensions::nim(cc, operand.mask, value),
            Operation::Oim => cpu_extensions::oim(cc, operand.mask, value),
            Operation::Xim => cpu_extensions::xim(cc, operand.mask, value),
            _ => {
                cpu_extensions::tmm(cc, operand.mask, value);
                return;
            }
        };
        self.io.write_byte(address, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FlatMemory(Vec<u8>);

    impl CpuIo for FlatMemory {
        fn read_byte(&mut self, address: u16) -> u8 {
            self.0[address as usize]
        }

        fn write_byte(&mut self, address: u16, value: u8) {
            self.0[address as usize] = value;
        }
    }

    fn cpu_with(program: &[u8]) -> Mb8861<FlatMemory> {
        let mut memory = vec![0u8; 0x10000];
        memory[..program.len()].copy_from_slice(program);
        let mut cpu = Mb8861::new(FlatMemory(memory));
        cpu.regs.sp = 0x01FF;
        cpu
    }

    #[test]
    fn test_ccr_byte_round_trip() {
        let cc = ConditionCodes::from_byte(0x2B);
        assert!(cc.h && cc.n && cc.v && cc.c);
        assert!(!cc.i && !cc.z);
        assert_eq!(cc.to_byte(), 0xEB);
    }

    #[test]
    fn test_zero_budget_does_nothing() {
        let mut cpu = cpu_with(&[0x01]);
        assert_eq!(cpu.step(0), 0);
        assert_eq!(cpu.pc(), 0x0000);
    }

    #[test]
    fn test_step_overshoots_budget() {
        let mut cpu = cpu_with(&[0x01, 0x01, 0x01]);
        assert_eq!(cpu.step(3), 4);
        assert_eq!(cpu.pc(), 0x0002);
    }

    #[test]
    fn test_reset_loads_vector() {
        let mut cpu = cpu_with(&[]);
        cpu.io.0[0xFFFE] = 0xE0;
        cpu.io.0[0xFFFF] = 0x00;
        cpu.regs.a = 0x12;
        cpu.signal_nmi();

        cpu.reset();
        assert_eq!(cpu.next_state(), ExecState::ServicingReset);
        assert_eq!(cpu.execute_next(), RESET_CYCLES);

        assert_eq!(cpu.pc(), 0xE000);
        assert_eq!(cpu.regs.a, 0x00);
        assert_eq!(cpu.regs.cc.to_byte(), 0xD0);
        assert_eq!(cpu.signals, Signals::default());
    }

    #[test]
    fn test_priority_order() {
        let mut cpu = cpu_with(&[]);
        cpu.signal_irq();
        cpu.signal_nmi();
        cpu.signal_halt(true);
        assert_eq!(cpu.next_state(), ExecState::Halted);

        cpu.signal_halt(false);
        assert_eq!(cpu.next_state(), ExecState::ServicingNmi);

        cpu.signals.nmi = false;
        cpu.regs.cc.i = true;
        assert_eq!(cpu.next_state(), ExecState::Running);
        cpu.regs.cc.i = false;
        assert_eq!(cpu.next_state(), ExecState::ServicingIrq);
    }

    #[test]
    fn test_undefined_opcode_costs_one_cycle() {
        let mut cpu = cpu_with(&[0x00, 0x00]);
        let before = cpu.regs;
        assert_eq!(cpu.execute_next(), UNDEFINED_OPCODE_CYCLES);
        assert_eq!(cpu.pc(), 0x0001);
        assert_eq!(cpu.regs.a, before.a);
        assert_eq!(cpu.regs.cc, before.cc);
    }

    #[test]
    fn test_push_all_layout() {
        let mut cpu = cpu_with(&[0x3F]);
        cpu.io.0[0xFFFA] = 0x12;
        cpu.io.0[0xFFFB] = 0x34;
        cpu.regs.a = 0xAA;
        cpu.regs.b = 0xBB;
        cpu.regs.x = 0xBEEF;

        assert_eq!(cpu.execute_next(), 12);

        assert_eq!(cpu.regs.sp, 0x01F8);
        assert_eq!(&cpu.io.0[0x01F9..=0x01FF], &[0xC0, 0xBB, 0xAA, 0xBE, 0xEF, 0x00, 0x02]);
        assert_eq!(cpu.pc(), 0x1234);
        assert!(cpu.regs.cc.i);
    }
}
