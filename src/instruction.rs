use std::fmt;

use once_cell::sync::Lazy;

use crate::memory::MemorySystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Inherent,
    AccumulatorA,
    AccumulatorB,
    Immediate,
    Direct,
    Indexed,
    Extended,
    Relative,
    /// MB8861 bit operations: an immediate mask followed by an index offset.
    IndexedImmediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Sub,
    Cmp,
    Sbc,
    And,
    Bit,
    Lda,
    Eor,
    Adc,
    Ora,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOp {
    Neg,
    Com,
    Lsr,
    Ror,
    Asr,
    Asl,
    Rol,
    Dec,
    Inc,
    Tst,
    Clr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    Hi,
    Ls,
    Cc,
    Cs,
    Ne,
    Eq,
    Vc,
    Vs,
    Pl,
    Mi,
    Ge,
    Lt,
    Gt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Alu(AluOp, Acc),
    Store(Acc),
    Modify(ModifyOp),
    Cpx,
    Ldx,
    Lds,
    Stx,
    Sts,
    Adx,
    Jmp,
    Jsr,
    Bsr,
    Branch(Condition),
    Rts,
    Rti,
    Swi,
    Wai,
    Nop,
    Tap,
    Tpa,
    Inx,
    Dex,
    Ins,
    Des,
    Tsx,
    Txs,
    Clv,
    Sev,
    Clc,
    Sec,
    Cli,
    Sei,
    Sba,
    Cba,
    Tab,
    Tba,
    Daa,
    Aba,
    Push(Acc),
    Pull(Acc),
    Nim,
    Oim,
    Xim,
    Tmm,
}

impl Operation {
    /// Operations whose immediate operand is a 16-bit word.
    pub fn has_wide_immediate(&self) -> bool {
        matches!(self, Operation::Cpx | Operation::Ldx | Operation::Lds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDef {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub operation: Operation,
    pub mode: AddressingMode,
    pub cycles: u32,
}

impl OpcodeDef {
    /// Total instruction length in bytes, opcode included.
    pub fn len(&self) -> u8 {
        1 + match self.mode {
            AddressingMode::Inherent
            | AddressingMode::AccumulatorA
            | AddressingMode::AccumulatorB => 0,
            AddressingMode::Immediate if self.operation.has_wide_immediate() => 2,
            AddressingMode::Immediate
            | AddressingMode::Direct
            | AddressingMode::Indexed
            | AddressingMode::Relative => 1,
            AddressingMode::Extended | AddressingMode::IndexedImmediate => 2,
        }
    }
}

pub static DECODE_TABLE: Lazy<[Option<OpcodeDef>; 256]> = Lazy::new(build_table);

pub fn decode(opcode: u8) -> Option<&'static OpcodeDef> {
    DECODE_TABLE[opcode as usize].as_ref()
}

const ALU_OPS: [(u8, AluOp, &str, &str); 10] = [
    (0x0, AluOp::Sub, "SUBA", "SUBB"),
    (0x1, AluOp::Cmp, "CMPA", "CMPB"),
    (0x2, AluOp::Sbc, "SBCA", "SBCB"),
    (0x4, AluOp::And, "ANDA", "ANDB"),
    (0x5, AluOp::Bit, "BITA", "BITB"),
    (0x6, AluOp::Lda, "LDAA", "LDAB"),
    (0x8, AluOp::Eor, "EORA", "EORB"),
    (0x9, AluOp::Adc, "ADCA", "ADCB"),
    (0xA, AluOp::Ora, "ORAA", "ORAB"),
    (0xB, AluOp::Add, "ADDA", "ADDB"),
];

const ALU_MODES: [(u8, AddressingMode, u32); 4] = [
    (0x00, AddressingMode::Immediate, 2),
    (0x10, AddressingMode::Direct, 3),
    (0x20, AddressingMode::Indexed, 5),
    (0x30, AddressingMode::Extended, 4),
];

const MODIFY_OPS: [(u8, ModifyOp, [&str; 3]); 11] = [
    (0x0, ModifyOp::Neg, ["NEGA", "NEGB", "NEG"]),
    (0x3, ModifyOp::Com, ["COMA", "COMB", "COM"]),
    (0x4, ModifyOp::Lsr, ["LSRA", "LSRB", "LSR"]),
    (0x6, ModifyOp::Ror, ["RORA", "RORB", "ROR"]),
    (0x7, ModifyOp::Asr, ["ASRA", "ASRB", "ASR"]),
    (0x8, ModifyOp::Asl, ["ASLA", "ASLB", "ASL"]),
    (0x9, ModifyOp::Rol, ["ROLA", "ROLB", "ROL"]),
    (0xA, ModifyOp::Dec, ["DECA", "DECB", "DEC"]),
    (0xC, ModifyOp::Inc, ["INCA", "INCB", "INC"]),
    (0xD, ModifyOp::Tst, ["TSTA", "TSTB", "TST"]),
    (0xF, ModifyOp::Clr, ["CLRA", "CLRB", "CLR"]),
];

const MODIFY_MODES: [(u8, AddressingMode, u32, usize); 4] = [
    (0x40, AddressingMode::AccumulatorA, 2, 0),
    (0x50, AddressingMode::AccumulatorB, 2, 1),
    (0x60, AddressingMode::Indexed, 7, 2),
    (0x70, AddressingMode::Extended, 6, 2),
];

const BRANCHES: [(u8, Condition, &str); 15] = [
    (0x20, Condition::Always, "BRA"),
    (0x22, Condition::Hi, "BHI"),
    (0x23, Condition::Ls, "BLS"),
    (0x24, Condition::Cc, "BCC"),
    (0x25, Condition::Cs, "BCS"),
    (0x26, Condition::Ne, "BNE"),
    (0x27, Condition::Eq, "BEQ"),
    (0x28, Condition::Vc, "BVC"),
    (0x29, Condition::Vs, "BVS"),
    (0x2A, Condition::Pl, "BPL"),
    (0x2B, Condition::Mi, "BMI"),
    (0x2C, Condition::Ge, "BGE"),
    (0x2D, Condition::Lt, "BLT"),
    (0x2E, Condition::Gt, "BGT"),
    (0x2F, Condition::Le, "BLE"),
];

const INHERENT: [(u8, Operation, &str, u32); 34] = [
    (0x01, Operation::Nop, "NOP", 2),
    (0x06, Operation::Tap, "TAP", 2),
    (0x07, Operation::Tpa, "TPA", 2),
    (0x08, Operation::Inx, "INX", 4),
    (0x09, Operation::Dex, "DEX", 4),
    (0x0A, Operation::Clv, "CLV", 2),
    (0x0B, Operation::Sev, "SEV", 2),
    (0x0C, Operation::Clc, "CLC", 2),
    (0x0D, Operation::Sec, "SEC", 2),
    (0x0E, Operation::Cli, "CLI", 2),
    (0x0F, Operation::Sei, "SEI", 2),
    (0x10, Operation::Sba, "SBA", 2),
    (0x11, Operation::Cba, "CBA", 2),
    (0x16, Operation::Tab, "TAB", 2),
    (0x17, Operation::Tba, "TBA", 2),
    (0x19, Operation::Daa, "DAA", 2),
    (0x1B, Operation::Aba, "ABA", 2),
    (0x30, Operation::Tsx, "TSX", 4),
    (0x31, Operation::Ins, "INS", 4),
    (0x32, Operation::Pull(Acc::A), "PULA", 4),
    (0x33, Operation::Pull(Acc::B), "PULB", 4),
    (0x34, Operation::Des, "DES", 4),
    (0x35, Operation::Txs, "TXS", 4),
    (0x36, Operation::Push(Acc::A), "PSHA", 4),
    (0x37, Operation::Push(Acc::B), "PSHB", 4),
    (0x39, Operation::Rts, "RTS", 5),
    (0x3B, Operation::Rti, "RTI", 10),
    (0x3E, Operation::Wai, "WAI", 9),
    (0x3F, Operation::Swi, "SWI", 12),
    // MB8861 extensions
    (0x71, Operation::Nim, "NIM", 8),
    (0x72, Operation::Oim, "OIM", 8),
    (0x75, Operation::Xim, "XIM", 8),
    (0x7B, Operation::Tmm, "TMM", 7),
    (0x8D, Operation::Bsr, "BSR", 8),
];

// (opcode, operation, mnemonic, mode, cycles) for the index/stack register family
const WORD_OPS: [(u8, Operation, &str, AddressingMode, u32); 24] = [
    (0x8C, Operation::Cpx, "CPX", AddressingMode::Immediate, 3),
    (0x9C, Operation::Cpx, "CPX", AddressingMode::Direct, 4),
    (0xAC, Operation::Cpx, "CPX", AddressingMode::Indexed, 6),
    (0xBC, Operation::Cpx, "CPX", AddressingMode::Extended, 5),
    (0x8E, Operation::Lds, "LDS", AddressingMode::Immediate, 3),
    (0x9E, Operation::Lds, "LDS", AddressingMode::Direct, 4),
    (0xAE, Operation::Lds, "LDS", AddressingMode::Indexed, 6),
    (0xBE, Operation::Lds, "LDS", AddressingMode::Extended, 5),
    (0x9F, Operation::Sts, "STS", AddressingMode::Direct, 5),
    (0xAF, Operation::Sts, "STS", AddressingMode::Indexed, 7),
    (0xBF, Operation::Sts, "STS", AddressingMode::Extended, 6),
    (0xCE, Operation::Ldx, "LDX", AddressingMode::Immediate, 3),
    (0xDE, Operation::Ldx, "LDX", AddressingMode::Direct, 4),
    (0xEE, Operation::Ldx, "LDX", AddressingMode::Indexed, 6),
    (0xFE, Operation::Ldx, "LDX", AddressingMode::Extended, 5),
    (0xDF, Operation::Stx, "STX", AddressingMode::Direct, 5),
    (0xEF, Operation::Stx, "STX", AddressingMode::Indexed, 7),
    (0xFF, Operation::Stx, "STX", AddressingMode::Extended, 6),
    (0xEC, Operation::Adx, "ADX", AddressingMode::Immediate, 3),
    (0xFC, Operation::Adx, "ADX", AddressingMode::Extended, 7),
    (0xAD, Operation::Jsr, "JSR", AddressingMode::Indexed, 8),
    (0xBD, Operation::Jsr, "JSR", AddressingMode::Extended, 9),
    (0x6E, Operation::Jmp, "JMP", AddressingMode::Indexed, 4),
    (0x7E, Operation::Jmp, "JMP", AddressingMode::Extended, 3),
];

fn put(
    table: &mut [Option<OpcodeDef>; 256],
    opcode: u8,
    mnemonic: &'static str,
    operation: Operation,
    mode: AddressingMode,
    cycles: u32,
) {
    table[opcode as usize] = Some(OpcodeDef {
        opcode,
        mnemonic,
        operation,
        mode,
        cycles,
    });
}

fn build_table() -> [Option<OpcodeDef>; 256] {
    let mut table = [None; 256];

    for (acc, base) in [(Acc::A, 0x80u8), (Acc::B, 0xC0u8)] {
        for (low, op, mnemonic_a, mnemonic_b) in ALU_OPS {
            let mnemonic = if acc == Acc::A { mnemonic_a } else { mnemonic_b };
            for (column, mode, cycles) in ALU_MODES {
                put(&mut table, base | column | low, mnemonic, Operation::Alu(op, acc), mode, cycles);
            }
        }

        let mnemonic = if acc == Acc::A { "STAA" } else { "STAB" };
        put(&mut table, base | 0x17, mnemonic, Operation::Store(acc), AddressingMode::Direct, 4);
        put(&mut table, base | 0x27, mnemonic, Operation::Store(acc), AddressingMode::Indexed, 6);
        put(&mut table, base | 0x37, mnemonic, Operation::Store(acc), AddressingMode::Extended, 5);
    }

    // ORAB extended executes as ADDB extended on this part.
    put(
        &mut table,
        0xFA,
        "ORAB",
        Operation::Alu(AluOp::Add, Acc::B),
        AddressingMode::Extended,
        4,
    );

    for (low, op, mnemonics) in MODIFY_OPS {
        for (column, mode, cycles, name) in MODIFY_MODES {
            put(&mut table, column | low, mnemonics[name], Operation::Modify(op), mode, cycles);
        }
    }

    for (opcode, condition, mnemonic) in BRANCHES {
        put(
            &mut table,
            opcode,
            mnemonic,
            Operation::Branch(condition),
            AddressingMode::Relative,
            4,
        );
    }

    for (opcode, operation, mnemonic, cycles) in INHERENT {
        let mode = match operation {
            Operation::Nim | Operation::Oim | Operation::Xim | Operation::Tmm => {
                AddressingMode::IndexedImmediate
            }
            Operation::Bsr => AddressingMode::Relative,
            _ => AddressingMode::Inherent,
        };
        put(&mut table, opcode, mnemonic, operation, mode, cycles);
    }

    for (opcode, operation, mnemonic, mode, cycles) in WORD_OPS {
        put(&mut table, opcode, mnemonic, operation, mode, cycles);
    }

    table
}

/// A decoded instruction at a given address, for tracing and disassembly.
pub struct Instruction<'a> {
    pub opcode: u8,
    pub memory: &'a MemorySystem,
    pub pc: u16,
}

impl<'a> Instruction<'a> {
    pub fn parse_at(memory: &'a MemorySystem, pc: u16) -> Self {
        let opcode = memory.peek8(pc);
        Instruction { opcode, memory, pc }
    }

    pub fn def(&self) -> Option<&'static OpcodeDef> {
        decode(self.opcode)
    }

    pub fn len(&self) -> u8 {
        self.def().map(|def| def.len()).unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn arg(&self, n: u16) -> u8 {
        self.memory.peek8(self.pc.wrapping_add(n))
    }

    fn word_arg(&self) -> u16 {
        ((self.arg(1) as u16) << 8) | self.arg(2) as u16
    }

    pub fn name(&self) -> String {
        let Some(def) = self.def() else {
            return format!("??? ${:02X}", self.opcode);
        };

        match def.mode {
            AddressingMode::Inherent
            | AddressingMode::AccumulatorA
            | AddressingMode::AccumulatorB => def.mnemonic.to_string(),
            AddressingMode::Immediate if def.operation.has_wide_immediate() => {
                format!("{} #${:04X}", def.mnemonic, self.word_arg())
            }
            AddressingMode::Immediate => format!("{} #${:02X}", def.mnemonic, self.arg(1)),
            AddressingMode::Direct => format!("{} ${:02X}", def.mnemonic, self.arg(1)),
            AddressingMode::Indexed => format!("{} ${:02X},X", def.mnemonic, self.arg(1)),
            AddressingMode::Extended => format!("{} ${:04X}", def.mnemonic, self.word_arg()),
            AddressingMode::Relative => {
                let target = self
                    .pc
                    .wrapping_add(2)
                    .wrapping_add(self.arg(1) as i8 as u16);
                format!("{} ${:04X}", def.mnemonic, target)
            }
            AddressingMode::IndexedImmediate => {
                format!("{} #${:02X},${:02X},X", def.mnemonic, self.arg(1), self.arg(2))
            }
        }
    }

    pub fn opcode_with_args(&self) -> String {
        let mut bytes = format!("{:02X}", self.opcode);
        for n in 1..self.len() as u16 {
            bytes.push_str(&format!(" {:02X}", self.arg(n)));
        }
        bytes
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}  {:<9} {}",
            self.pc,
            self.opcode_with_args(),
            self.name()
        )
    }
}
