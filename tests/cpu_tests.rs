use std::{cell::RefCell, rc::Rc};

use jr100::{
    bus::Bus,
    cpu::ExecState,
    memory::MemorySystem,
    region::{DeviceHandle, MappedDevice},
};
use tracing_subscriber::fmt;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let fmt_subscriber = fmt::Subscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(fmt_subscriber)
        .expect("Unable to set global tracing subscriber");
}

const IRQ_HANDLER: u16 = 0x0400;
const NMI_HANDLER: u16 = 0x0420;
const IRQ_COUNT: u16 = 0x0010;
const NMI_COUNT: u16 = 0x0011;

fn vector_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x100];
    for (offset, target) in [(0xF8, IRQ_HANDLER), (0xFA, 0x0410), (0xFC, NMI_HANDLER), (0xFE, 0x0300)] {
        rom[offset] = (target >> 8) as u8;
        rom[offset + 1] = target as u8;
    }
    rom
}

/// RAM below 0x8000, vectors pointing into RAM, `program` at 0x0300 and the
/// CPU already out of reset.
fn bus_with(program: &[u8]) -> Bus {
    let memory = MemorySystem::builder()
        .ram("ram", 0x0000, 0x8000)
        .rom("vectors", 0xFF00, 0x100, &vector_rom())
        .build()
        .unwrap();
    let mut bus = Bus::new(memory);
    {
        let mut memory = bus.memory.borrow_mut();
        memory.write_block(0x0300, program);
        // INC $0010; RTI
        memory.write_block(IRQ_HANDLER, &[0x7C, 0x00, 0x10, 0x3B]);
        // INC $0011; RTI
        memory.write_block(NMI_HANDLER, &[0x7C, 0x00, 0x11, 0x3B]);
    }
    bus.cpu.reset();
    bus.tick(1);
    bus.cpu.regs.sp = 0x01FF;
    bus
}

fn run_until(bus: &mut Bus, pc: u16, max_cycles: u32) {
    let mut executed = 0;
    while bus.cpu.pc() != pc {
        assert!(executed < max_cycles, "PC never reached {:04X}", pc);
        executed += bus.tick(8);
    }
}

#[test]
fn test_reset_vector_entry() {
    let bus = bus_with(&[0x20, 0xFE]);
    assert_eq!(bus.cpu.pc(), 0x0300);
    assert!(bus.cpu.regs.cc.i);
}

#[test]
fn test_stack_program() {
    #[rustfmt::skip]
    let main = [
        0xCE, 0x06, 0x00, // LDX #$0600
        0xDF, 0x42,       // STX $42      trace pointer
        0xBD, 0x03, 0x40, // JSR reset
        0xBD, 0x03, 0x60, // JSR peek
        0x86, 0x11,       // LDAA #$11
        0xBD, 0x03, 0x50, // JSR push
        0x86, 0x22,       // LDAA #$22
        0xBD, 0x03, 0x50, // JSR push
        0xBD, 0x03, 0x60, // JSR peek
        0xBD, 0x03, 0x80, // JSR pop
        0xBD, 0x03, 0x80, // JSR pop
        0xBD, 0x03, 0x80, // JSR pop
        0x20, 0xFE,       // BRA *
    ];
    #[rustfmt::skip]
    let reset = [
        0xCE, 0x05, 0x00, // LDX #$0500
        0xDF, 0x40,       // STX $40      stack pointer
        0x39,             // RTS
    ];
    #[rustfmt::skip]
    let push = [
        0xDE, 0x40,       // LDX $40
        0x8C, 0x05, 0x08, // CPX #$0508
        0x27, 0x05,       // BEQ full
        0xA7, 0x00,       // STAA 0,X
        0x08,             // INX
        0xDF, 0x40,       // STX $40
        0x39,             // full: RTS
    ];
    #[rustfmt::skip]
    let peek = [
        0xDE, 0x40,       // LDX $40
        0x8C, 0x05, 0x00, // CPX #$0500
        0x27, 0x05,       // BEQ empty
        0x09,             // DEX
        0xA6, 0x00,       // LDAA 0,X
        0x20, 0x02,       // BRA record
        0x86, 0x00,       // empty: LDAA #$00
        0xDE, 0x42,       // record: LDX $42
        0xA7, 0x00,       // STAA 0,X
        0x08,             // INX
        0xDF, 0x42,       // STX $42
        0x39,             // RTS
    ];
    #[rustfmt::skip]
    let pop = [
        0xDE, 0x40,       // LDX $40
        0x8C, 0x05, 0x00, // CPX #$0500
        0x27, 0xE5,       // BEQ empty
        0x09,             // DEX
        0xDF, 0x40,       // STX $40
        0xA6, 0x00,       // LDAA 0,X
        0x20, 0xE0,       // BRA record
    ];

    let mut bus = bus_with(&main);
    {
        let mut memory = bus.memory.borrow_mut();
        memory.write_block(0x0340, &reset);
        memory.write_block(0x0350, &push);
        memory.write_block(0x0360, &peek);
        memory.write_block(0x0380, &pop);
        memory.write_block(0x04F0, &[0xEE; 0x20]);
        memory.write_block(0x0600, &[0xEE; 0x08]);
    }

    run_until(&mut bus, 0x0321, 10_000);

    let memory = bus.memory.borrow();
    assert_eq!(memory.dump(0x0600, 0x0607), vec![0x00, 0x22, 0x22, 0x11, 0x00, 0xEE, 0xEE, 0xEE]);
    assert_eq!(
        memory.dump(0x0500, 0x0507),
        vec![0x11, 0x22, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE]
    );
    assert_eq!(memory.dump(0x04F0, 0x04FF), vec![0xEE; 0x10]);
    assert_eq!(memory.dump(0x0508, 0x050F), vec![0xEE; 0x08]);
    assert_eq!(memory.dump(0x0040, 0x0043), vec![0x05, 0x00, 0x06, 0x05]);
}

#[derive(Debug, Default)]
struct WriteLog {
    writes: Vec<(u16, u8)>,
}

impl MappedDevice for WriteLog {
    fn read(&mut self, _offset: u16) -> u8 {
        0x00
    }

    fn write(&mut self, offset: u16, value: u8) {
        self.writes.push((offset, value));
    }

    fn peek(&self, _offset: u16) -> u8 {
        0x00
    }
}

#[test]
fn test_word_stores_write_high_byte_first() {
    let log = Rc::new(RefCell::new(WriteLog::default()));
    let device: DeviceHandle = log.clone();
    let memory = MemorySystem::builder()
        .ram("ram", 0x0000, 0x8000)
        .device("log", 0x8000, 0x10, device)
        .rom("vectors", 0xFF00, 0x100, &vector_rom())
        .build()
        .unwrap();
    let mut bus = Bus::new(memory);
    #[rustfmt::skip]
    let program = [
        0xCE, 0x12, 0x34, // LDX #$1234
        0xFF, 0x80, 0x00, // STX $8000
        0x8E, 0xAB, 0xCD, // LDS #$ABCD
        0xBF, 0x80, 0x04, // STS $8004
        0x20, 0xFE,       // BRA *
    ];
    bus.memory.borrow_mut().write_block(0x0300, &program);
    bus.cpu.reset();
    bus.tick(1);

    run_until(&mut bus, 0x030C, 1_000);
    assert_eq!(
        log.borrow().writes,
        vec![(0x00, 0x12), (0x01, 0x34), (0x04, 0xAB), (0x05, 0xCD)]
    );
}

#[test]
fn test_nmi_ignores_interrupt_mask() {
    // SEI; BRA *
    let mut bus = bus_with(&[0x0F, 0x20, 0xFE]);
    run_until(&mut bus, 0x0301, 100);

    bus.cpu.signal_nmi();
    bus.tick(40);
    assert_eq!(bus.peek8(NMI_COUNT), 1);
    assert_eq!(bus.cpu.pc(), 0x0301);
    assert!(bus.cpu.regs.cc.i);
}

#[test]
fn test_irq_waits_for_mask_and_services_once() {
    let mut bus = bus_with(&[0x0F, 0x20, 0xFE]);
    run_until(&mut bus, 0x0301, 100);

    bus.cpu.signal_irq();
    bus.tick(40);
    assert_eq!(bus.peek8(IRQ_COUNT), 0);
    assert!(bus.cpu.signals.irq);

    bus.cpu.regs.cc.i = false;
    bus.tick(40);
    assert_eq!(bus.peek8(IRQ_COUNT), 1);
    assert!(!bus.cpu.signals.irq);

    bus.tick(100);
    assert_eq!(bus.peek8(IRQ_COUNT), 1);
}

#[test]
fn test_wai_parks_until_interrupt() {
    // CLI; WAI; BRA *
    let mut bus = bus_with(&[0x0E, 0x3E, 0x20, 0xFE]);
    bus.tick(20);
    assert!(bus.cpu.parked);
    assert_eq!(bus.cpu.state(), ExecState::WaitingForInterrupt);
    // registers are stacked on entry to WAI
    assert_eq!(bus.cpu.regs.sp, 0x01F8);

    bus.cpu.signal_irq();
    bus.tick(40);
    assert!(!bus.cpu.parked);
    assert_eq!(bus.peek8(IRQ_COUNT), 1);
    assert_eq!(bus.cpu.pc(), 0x0302);
    assert_eq!(bus.cpu.regs.sp, 0x01FF);
}

#[test]
fn test_reset_releases_halt() {
    let mut bus = bus_with(&[0x01, 0x01, 0x20, 0xFE]);
    bus.cpu.signal_halt(true);
    assert_eq!(bus.tick(10), 10);
    assert_eq!(bus.cpu.pc(), 0x0300);
    assert_eq!(bus.cpu.state(), ExecState::Halted);

    bus.cpu.reset();
    bus.tick(1);
    assert!(!bus.cpu.halted());
    bus.tick(4);
    assert_eq!(bus.cpu.pc(), 0x0302);
}

#[test]
fn test_indexed_jump_goes_through_pointer() {
    #[rustfmt::skip]
    let program = [
        0xCE, 0x01, 0x00, // LDX #$0100
        0x6E, 0x05,       // JMP 5,X
    ];
    let mut bus = bus_with(&program);
    bus.memory.borrow_mut().write_block(0x0105, &[0x56, 0x78]);

    bus.cpu.execute_next();
    bus.cpu.execute_next();
    assert_eq!(bus.cpu.pc(), 0x5678);
    assert_eq!(bus.cpu.regs.sp, 0x01FF);
}

#[test]
fn test_indexed_subroutine_call_goes_through_pointer() {
    #[rustfmt::skip]
    let program = [
        0xCE, 0x01, 0x00, // LDX #$0100
        0xAD, 0x07,       // JSR 7,X
    ];
    let mut bus = bus_with(&program);
    bus.memory.borrow_mut().write_block(0x0107, &[0x12, 0x34]);

    bus.cpu.execute_next();
    bus.cpu.execute_next();
    assert_eq!(bus.cpu.pc(), 0x1234);
    assert_eq!(bus.cpu.regs.sp, 0x01FD);
    assert_eq!(bus.memory.borrow().dump(0x01FE, 0x01FF), vec![0x03, 0x05]);
}

#[test]
fn test_software_interrupt_returns_past_signature_byte() {
    #[rustfmt::skip]
    let program = [
        0x3F,             // SWI
        0x00,             // signature byte
        0x4C,             // INCA
        0x20, 0xFE,       // BRA *
    ];
    let mut bus = bus_with(&program);
    // RTI
    bus.memory.borrow_mut().write_block(0x0410, &[0x3B]);

    assert_eq!(bus.cpu.execute_next(), 12);
    assert_eq!(bus.cpu.pc(), 0x0410);
    assert_eq!(bus.cpu.regs.sp, 0x01F8);
    assert_eq!(bus.memory.borrow().dump(0x01FE, 0x01FF), vec![0x03, 0x02]);

    bus.cpu.execute_next();
    assert_eq!(bus.cpu.pc(), 0x0302);
    assert_eq!(bus.cpu.regs.sp, 0x01FF);

    bus.cpu.execute_next();
    assert_eq!(bus.cpu.regs.a, 0x01);
}
