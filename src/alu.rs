//! Flag arithmetic for the 8-bit accumulator and 16-bit register operations.
//!
//! Every helper takes the operands plus the condition code register and
//! returns the result, leaving the caller to store it.

use crate::cpu::ConditionCodes;

fn overflow_add(x: u8, y: u8, result: u8) -> bool {
    let (sx, sy) = (x as i8, y as i8);
    let negative = result & 0x80 != 0;
    (sx > 0 && sy > 0 && negative) || (sx < 0 && sy < 0 && !negative)
}

fn overflow_sub(x: u8, y: u8, result: u8) -> bool {
    let (sx, sy) = (x as i8, y as i8);
    let negative = result & 0x80 != 0;
    (sx > 0 && sy < 0 && negative) || (sx < 0 && sy > 0 && !negative)
}

/// ADD, ADC and ABA.
pub fn add(cc: &mut ConditionCodes, x: u8, y: u8, carry: bool) -> u8 {
    let sum = x as u16 + y as u16 + carry as u16;
    let result = sum as u8;

    cc.h = (x & 0x0F) + (y & 0x0F) > 0x0F;
    cc.set_nz(result);
    cc.v = overflow_add(x, y, result);
    cc.c = sum & 0x100 != 0;

    result
}

/// SUB, SBC, CMP, SBA and CBA. H is left alone.
pub fn sub(cc: &mut ConditionCodes, x: u8, y: u8, borrow: bool) -> u8 {
    let difference = x as i16 - y as i16 - borrow as i16;
    let result = difference as u8;

    cc.set_nz(result);
    cc.v = overflow_sub(x, y, result);
    cc.c = difference < 0;

    result
}

/// LDA, AND, BIT, EOR, ORA and STA flags.
pub fn logic(cc: &mut ConditionCodes, result: u8) -> u8 {
    cc.set_nz(result);
    cc.v = false;
    result
}

pub fn neg(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = 0u8.wrapping_sub(x);
    cc.set_nz(result);
    cc.v = result == 0x80;
    cc.c = result == 0x00;
    result
}

pub fn com(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = !x;
    cc.set_nz(result);
    cc.v = false;
    cc.c = true;
    result
}

fn shift_flags(cc: &mut ConditionCodes, result: u8, carry: bool) {
    cc.set_nz(result);
    cc.c = carry;
    cc.v = cc.n ^ cc.c;
}

pub fn lsr(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = x >> 1;
    shift_flags(cc, result, x & 0x01 != 0);
    result
}

pub fn ror(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = (x >> 1) | if cc.c { 0x80 } else { 0x00 };
    shift_flags(cc, result, x & 0x01 != 0);
    result
}

pub fn asr(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = (x >> 1) | (x & 0x80);
    shift_flags(cc, result, x & 0x01 != 0);
    result
}

pub fn asl(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = x << 1;
    shift_flags(cc, result, x & 0x80 != 0);
    result
}

pub fn rol(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = (x << 1) | cc.c as u8;
    shift_flags(cc, result, x & 0x80 != 0);
    result
}

pub fn dec(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = x.wrapping_sub(1);
    cc.set_nz(result);
    cc.v = x == 0x80;
    result
}

pub fn inc(cc: &mut ConditionCodes, x: u8) -> u8 {
    let result = x.wrapping_add(1);
    cc.set_nz(result);
    cc.v = x == 0x7F;
    result
}

pub fn tst(cc: &mut ConditionCodes, x: u8) {
    cc.set_nz(x);
    cc.v = false;
    cc.c = false;
}

pub fn clr(cc: &mut ConditionCodes) -> u8 {
    cc.n = false;
    cc.z = true;
    cc.v = false;
    cc.c = false;
    0x00
}

/// Decimal adjust after a BCD addition.
pub fn daa(cc: &mut ConditionCodes, a: u8) -> u8 {
    let mut adjusted = a as u16;
    if (adjusted & 0x0F) >= 0x0A || cc.h {
        adjusted += 0x06;
    }
    if (adjusted & 0xF0) >= 0xA0 {
        adjusted += 0x60;
    }
    let result = adjusted as u8;

    let signed_before = a as i8;
    cc.c = (a & 0xF0) >= 0xA0 || cc.c;
    cc.set_nz(result);
    cc.v = (signed_before > 0 && cc.n) || (signed_before < 0 && !cc.n);

    result
}

/// LDX, LDS, STX and STS flags.
pub fn load16(cc: &mut ConditionCodes, value: u16) {
    cc.set_nz16(value);
    cc.v = false;
}

/// CPX compares X against a word, leaving C untouched.
pub fn cpx(cc: &mut ConditionCodes, x: u16, operand: u16) {
    let result = x.wrapping_sub(operand);
    let (sx, so) = (x as i16, operand as i16);
    let negative = result & 0x8000 != 0;

    cc.set_nz16(result);
    cc.v = (sx > 0 && so < 0 && negative) || (sx < 0 && so > 0 && !negative);
}

pub fn branch_taken(cc: &ConditionCodes, condition: crate::instruction::Condition) -> bool {
    use crate::instruction::Condition::*;

    match condition {
        Always => true,
        Hi => !(cc.c || cc.z),
        Ls => cc.c || cc.z,
        Cc => !cc.c,
        Cs => cc.c,
        Ne => !cc.z,
        Eq => cc.z,
        Vc => !cc.v,
        Vs => cc.v,
        Pl => !cc.n,
        Mi => cc.n,
        Ge => !(cc.n ^ cc.v),
        Lt => cc.n ^ cc.v,
        Gt => !(cc.z || (cc.n ^ cc.v)),
        Le => cc.z || (cc.n ^ cc.v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_half_carry_and_carry() {
        let mut cc = ConditionCodes::default();
        assert_eq!(add(&mut cc, 0x8F, 0x81, false), 0x10);
        assert!(cc.h);
        assert!(cc.c);
        assert!(cc.v);
        assert!(!cc.n);
    }

    #[test]
    fn test_half_carry_ignores_carry_in() {
        let mut cc = ConditionCodes::default();
        add(&mut cc, 0x0F, 0x00, true);
        assert!(!cc.h);
    }

    #[test]
    fn test_sub_with_borrow() {
        let mut cc = ConditionCodes::default();
        assert_eq!(sub(&mut cc, 0x10, 0x11, false), 0xFF);
        assert!(cc.c);
        assert!(cc.n);
        assert!(!cc.v);

        assert_eq!(sub(&mut cc, 0x00, 0x00, true), 0xFF);
        assert!(cc.c);
    }

    #[test]
    fn test_sub_overflow() {
        let mut cc = ConditionCodes::default();
        assert_eq!(sub(&mut cc, 0x80, 0x01, false), 0x7F);
        assert!(cc.v);
        assert!(!cc.c);
    }

    #[test]
    fn test_inc_dec_overflow() {
        let mut cc = ConditionCodes::default();
        assert_eq!(inc(&mut cc, 0x7F), 0x80);
        assert!(cc.v && cc.n);
        assert_eq!(dec(&mut cc, 0x80), 0x7F);
        assert!(cc.v && !cc.n);
        assert_eq!(dec(&mut cc, 0x01), 0x00);
        assert!(cc.z && !cc.v);
    }

    #[test]
    fn test_neg() {
        let mut cc = ConditionCodes::default();
        assert_eq!(neg(&mut cc, 0x55), 0xAB);
        assert!(cc.n);
        assert!(!cc.c);
        assert_eq!(neg(&mut cc, 0x80), 0x80);
        assert!(cc.v);
    }

    #[test]
    fn test_lsr_clears_negative() {
        let mut cc = ConditionCodes {
            n: true,
            ..Default::default()
        };
        assert_eq!(lsr(&mut cc, 0x01), 0x00);
        assert!(!cc.n);
        assert!(cc.z);
        assert!(cc.c);
        assert!(cc.v);
    }

    #[test]
    fn test_rotates_through_carry() {
        let mut cc = ConditionCodes {
            c: true,
            ..Default::default()
        };
        assert_eq!(rol(&mut cc, 0x10), 0x21);
        assert!(!cc.c && !cc.v);

        cc.c = true;
        assert_eq!(ror(&mut cc, 0x02), 0x81);
        assert!(!cc.c && cc.n && cc.v);
    }

    #[test]
    fn test_daa() {
        let mut cc = ConditionCodes::default();
        assert_eq!(daa(&mut cc, 0xA5), 0x05);
        assert!(cc.c);

        let mut cc = ConditionCodes {
            h: true,
            ..Default::default()
        };
        assert_eq!(daa(&mut cc, 0x12), 0x18);
        assert!(!cc.c);
    }

    #[test]
    fn test_cpx_leaves_carry() {
        let mut cc = ConditionCodes {
            c: true,
            ..Default::default()
        };
        cpx(&mut cc, 0x1234, 0x1234);
        assert!(cc.z);
        assert!(cc.c);
        cpx(&mut cc, 0x0000, 0x0001);
        assert!(cc.n && !cc.z);
    }

    #[test]
    fn test_signed_branches() {
        use crate::instruction::Condition;

        let cc = ConditionCodes {
            n: true,
            v: false,
            ..Default::default()
        };
        assert!(branch_taken(&cc, Condition::Lt));
        assert!(branch_taken(&cc, Condition::Le));
        assert!(!branch_taken(&cc, Condition::Ge));
        assert!(!branch_taken(&cc, Condition::Gt));

        let cc = ConditionCodes {
            c: true,
            ..Default::default()
        };
        assert!(branch_taken(&cc, Condition::Ls));
        assert!(!branch_taken(&cc, Condition::Hi));
    }
}
