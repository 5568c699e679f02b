// MB8861 additions over the plain 6800 instruction set: ADX and the
// immediate-to-indexed bit operations NIM, OIM, XIM and TMM.

use crate::cpu::ConditionCodes;

/// The bit operations share one operand layout: mask first, then offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitOperand {
    pub mask: u8,
    pub offset: u8,
}

impl BitOperand {
    pub fn address(&self, x: u16) -> u16 {
        x.wrapping_add(self.offset as u16)
    }
}

/// 16-bit add into X.
pub fn adx(cc: &mut ConditionCodes, x: u16, operand: u16) -> u16 {
    let sum = x as u32 + operand as u32;
    let result = sum as u16;
    let (sx, so) = (x as i16, operand as i16);
    let negative = result & 0x8000 != 0;

    cc.set_nz16(result);
    cc.v = (sx > 0 && so > 0 && negative) || (sx < 0 && so < 0 && !negative);
    cc.c = sum & 0x1_0000 != 0;

    result
}

fn bit_flags(cc: &mut ConditionCodes, result: u8) {
    cc.z = result == 0;
    cc.n = !cc.z;
}

pub fn nim(cc: &mut ConditionCodes, mask: u8, value: u8) -> u8 {
    let result = mask & value;
    bit_flags(cc, result);
    cc.v = false;
    result
}

pub fn oim(cc: &mut ConditionCodes, mask: u8, value: u8) -> u8 {
    let result = mask | value;
    bit_flags(cc, result);
    cc.v = false;
    result
}

/// Like NIM and OIM, but V is preserved.
pub fn xim(cc: &mut ConditionCodes, mask: u8, value: u8) -> u8 {
    let result = mask ^ value;
    bit_flags(cc, result);
    result
}

/// Tests memory against a mask without storing anything.
pub fn tmm(cc: &mut ConditionCodes, mask: u8, value: u8) {
    if mask == 0x00 || value == 0x00 {
        cc.n = false;
        cc.z = true;
        cc.v = false;
    } else if value == 0xFF {
        cc.n = false;
        cc.z = false;
        cc.v = true;
    } else {
        cc.n = true;
        cc.z = false;
        cc.v = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adx_overflow_and_carry() {
        let mut cc = ConditionCodes::default();
        assert_eq!(adx(&mut cc, 0x7FFF, 0x0001), 0x8000);
        assert!(cc.n && cc.v && !cc.c);

        assert_eq!(adx(&mut cc, 0xFFFF, 0x0001), 0x0000);
        assert!(cc.z && cc.c && !cc.v);
    }

    #[test]
    fn test_bit_ops_set_n_as_inverse_of_z() {
        let mut cc = ConditionCodes {
            v: true,
            ..Default::default()
        };
        assert_eq!(nim(&mut cc, 0x0F, 0xF0), 0x00);
        assert!(cc.z && !cc.n && !cc.v);

        cc.v = true;
        assert_eq!(xim(&mut cc, 0xFF, 0x0F), 0xF0);
        assert!(!cc.z && cc.n && cc.v);

        assert_eq!(oim(&mut cc, 0x01, 0x10), 0x11);
        assert!(!cc.z && cc.n && !cc.v);
    }

    #[test]
    fn test_tmm_cases() {
        let mut cc = ConditionCodes::default();
        tmm(&mut cc, 0x00, 0x55);
        assert!(cc.z && !cc.n && !cc.v);

        tmm(&mut cc, 0x01, 0xFF);
        assert!(!cc.z && !cc.n && cc.v);

        tmm(&mut cc, 0x01, 0x12);
        assert!(!cc.z && cc.n && !cc.v);
    }

    #[test]
    fn test_bit_operand_address_wraps() {
        let operand = BitOperand {
            mask: 0x01,
            offset: 0x10,
        };
        assert_eq!(operand.address(0xFFF8), 0x0008);
    }
}
