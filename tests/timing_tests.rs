#[cfg(test)]
mod timing_tests {
    use jr100::{
        clock::{Clock, ClockEvent},
        cpu::{CpuIo, Mb8861},
        instruction::decode,
        jr100::CPU_CLOCK_HZ,
        MachineBuilder,
    };

    struct FlatMemory(Vec<u8>);

    impl CpuIo for FlatMemory {
        fn read_byte(&mut self, address: u16) -> u8 {
            self.0[address as usize]
        }

        fn write_byte(&mut self, address: u16, value: u8) {
            self.0[address as usize] = value;
        }
    }

    fn cycles_for(opcode: u8, operand: u8) -> u32 {
        let mut memory = vec![operand; 0x10000];
        memory[0x1000] = opcode;
        let mut cpu = Mb8861::new(FlatMemory(memory));
        cpu.regs.pc = 0x1000;
        cpu.regs.sp = 0x2000;
        cpu.regs.x = 0x3000;
        cpu.execute_next()
    }

    #[test]
    fn test_cycles_independent_of_operands() {
        for opcode in 0..=0xFFu8 {
            let Some(def) = decode(opcode) else {
                assert_eq!(cycles_for(opcode, 0x00), 1, "opcode {:02X}", opcode);
                continue;
            };
            for operand in [0x00, 0x7F, 0x80, 0xFF] {
                assert_eq!(
                    cycles_for(opcode, operand),
                    def.cycles,
                    "{} ({:02X}) with operand {:02X}",
                    def.mnemonic,
                    opcode,
                    operand
                );
            }
        }
    }

    #[test]
    fn test_frame_length() {
        let mut clock = Clock::default();
        let frame = CPU_CLOCK_HZ / 60;

        let events = clock.tick(frame);
        assert!(events.contains(&ClockEvent::Refresh));
        assert_eq!(clock.frame_count(), 1);
        assert!((clock.elapsed_ns() - 1e9 / 60.0).abs() < 1_000.0);
    }

    #[test]
    fn test_via_runs_in_lockstep_with_cpu() {
        let mut rom = vec![0u8; 0x2000];
        rom[0..2].copy_from_slice(&[0x20, 0xFE]);
        rom[0x1FFE..].copy_from_slice(&[0xE0, 0x00]);
        let mut machine = MachineBuilder::new().basic_rom(&rom).build().unwrap();
        machine.power_on();

        let mut executed = 0u64;
        for budget in [1, 7, 100, 1_000, 33] {
            executed += machine.tick(budget) as u64;
        }

        assert_eq!(machine.clock_count(), executed);
        assert_eq!(machine.clock.total_cycles(), executed);
        assert_eq!(machine.via.borrow().state.clock, executed);
    }

    #[test]
    fn test_custom_clock_frequency() {
        let machine = MachineBuilder::new()
            .clock_frequency(1_000_000)
            .refresh_rate(50.0)
            .build()
            .unwrap();
        assert_eq!(machine.clock.frequency(), 1_000_000);
        assert_eq!(machine.clock.refresh_interval(), 20_000);
    }
}
