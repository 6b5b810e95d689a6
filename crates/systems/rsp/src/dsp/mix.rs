//! Plain mixing and scaling. Counts are in bytes.

use super::{clamp_s16, sadd, vmulf};
use crate::memory::RspMemory;

/// `dst += vmulf(src, gain)` with saturation.
pub fn mix(mem: &mut RspMemory, dmemo: u16, dmemi: u16, count: u16, gain: i16) {
    for k in 0..(count >> 1) {
        let o = u32::from(dmemo.wrapping_add(k << 1));
        let src = mem.dmem.i16(u32::from(dmemi.wrapping_add(k << 1)));
        let dst = mem.dmem.i16(o);
        mem.dmem.set_i16(o, clamp_s16(dst as i32 + vmulf(src, gain) as i32));
    }
}

/// In-place scale by a signed Q4.4 gain.
pub fn mult_q44(mem: &mut RspMemory, dmem: u16, count: u16, gain: i8) {
    for k in 0..(count >> 1) {
        let o = u32::from(dmem.wrapping_add(k << 1));
        let x = mem.dmem.i16(o) as i32;
        mem.dmem.set_i16(o, clamp_s16((x * i32::from(gain)) >> 4));
    }
}

/// `dst += src` with saturation.
pub fn add(mem: &mut RspMemory, dmemo: u16, dmemi: u16, count: u16) {
    for k in 0..(count >> 1) {
        let o = u32::from(dmemo.wrapping_add(k << 1));
        let src = mem.dmem.i16(u32::from(dmemi.wrapping_add(k << 1)));
        let dst = mem.dmem.i16(o);
        mem.dmem.set_i16(o, sadd(dst, src));
    }
}
