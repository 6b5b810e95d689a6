//! Pitch resampling: 4-tap polyphase interpolation and zero-order hold.
//!
//! The pitch is Q16.16 and drives a 16-bit fractional accumulator. The top
//! six bits of the accumulator select one of 64 filter phases.

use super::{clamp_s16, sample_addr};
use crate::memory::RspMemory;
use hle_core::logging::{log, LogCategory, LogLevel};

/// Phase 0..31 of the 4-tap interpolation filter; phase `63 - k` is phase
/// `k` with its taps reversed.
const RESAMPLE_HALF_LUT: [[u16; 4]; 32] = [
    [0x0c39, 0x66ad, 0x0d46, 0xffdf],
    [0x0b39, 0x6696, 0x0e5f, 0xffd8],
    [0x0a44, 0x6669, 0x0f83, 0xffd0],
    [0x095a, 0x6626, 0x10b4, 0xffc8],
    [0x087d, 0x65cd, 0x11f0, 0xffbf],
    [0x07ab, 0x655e, 0x1338, 0xffb6],
    [0x06e4, 0x64d9, 0x148c, 0xffac],
    [0x0628, 0x643f, 0x15eb, 0xffa1],
    [0x0577, 0x638f, 0x1756, 0xff96],
    [0x04d1, 0x62cb, 0x18cb, 0xff8a],
    [0x0435, 0x61f3, 0x1a4c, 0xff7e],
    [0x03a4, 0x6106, 0x1bd7, 0xff71],
    [0x031c, 0x6007, 0x1d6e, 0xff64],
    [0x029f, 0x5ef5, 0x1f0f, 0xff56],
    [0x022a, 0x5dd0, 0x20bb, 0xff48],
    [0x01be, 0x5c9a, 0x2270, 0xff3a],
    [0x015b, 0x5b53, 0x2430, 0xff2c],
    [0x0101, 0x59fc, 0x25f9, 0xff1e],
    [0x00ae, 0x5896, 0x27cc, 0xff10],
    [0x0063, 0x5720, 0x29a7, 0xff02],
    [0x001f, 0x559d, 0x2b8b, 0xfef5],
    [0xffe2, 0x540d, 0x2d77, 0xfee8],
    [0xffac, 0x5270, 0x2f6a, 0xfedb],
    [0xff7c, 0x50c7, 0x3165, 0xfed0],
    [0xff53, 0x4f14, 0x3366, 0xfec5],
    [0xff2e, 0x4d57, 0x356e, 0xfebb],
    [0xff0f, 0x4b91, 0x377c, 0xfeb2],
    [0xfef5, 0x49c2, 0x398f, 0xfeab],
    [0xfedf, 0x47ed, 0x3ba7, 0xfea5],
    [0xfecd, 0x4611, 0x3dc4, 0xfea0],
    [0xfebf, 0x4430, 0x3fe5, 0xfe9d],
    [0xfeb4, 0x424a, 0x420b, 0xfe9b],
];

/// Taps for accumulator phase `phase` (0..64).
#[inline]
fn lut_taps(phase: usize) -> [i16; 4] {
    let (row, reversed) = if phase < 32 {
        (RESAMPLE_HALF_LUT[phase], false)
    } else {
        (RESAMPLE_HALF_LUT[63 - phase], true)
    };
    let mut taps = row.map(|t| t as i16);
    if reversed {
        taps.reverse();
    }
    taps
}

/// Interpolating resampler.
///
/// The four samples preceding `dmemi` are the filter history: zeroed on
/// `init`, otherwise restored from `address` together with the pitch
/// accumulator. The history at the final read position and the accumulator
/// are saved back to `address` (10 bytes).
#[allow(clippy::too_many_arguments)]
pub fn resample(
    mem: &mut RspMemory,
    init: bool,
    flag2: bool,
    dmemo: u16,
    dmemi: u16,
    count: u16,
    pitch: u32,
    address: u32,
) {
    let mut ipos = (dmemi >> 1).wrapping_sub(4);
    let mut opos = dmemo >> 1;

    if flag2 {
        log(LogCategory::Stubs, LogLevel::Warn, || {
            "resample: flag2 is not implemented".to_string()
        });
    }

    let mut pitch_accu: u32 = if init {
        for k in 0..4 {
            mem.dmem.set_i16(sample_addr(ipos.wrapping_add(k)), 0);
        }
        0
    } else {
        for k in 0..4u16 {
            let s = mem.rdram.i16(address.wrapping_add(u32::from(k) * 2));
            mem.dmem.set_i16(sample_addr(ipos.wrapping_add(k)), s);
        }
        u32::from(mem.rdram.u16(address.wrapping_add(8)))
    };

    for _ in 0..(count >> 1) {
        let taps = lut_taps(((pitch_accu & 0xFC00) >> 10) as usize);
        let accu = taps.iter().enumerate().fold(0i32, |accu, (k, &tap)| {
            let x = mem.dmem.i16(sample_addr(ipos.wrapping_add(k as u16)));
            accu + x as i32 * tap as i32
        });
        mem.dmem.set_i16(sample_addr(opos), clamp_s16(accu >> 15));
        opos = opos.wrapping_add(1);

        pitch_accu = pitch_accu.wrapping_add(pitch);
        ipos = ipos.wrapping_add((pitch_accu >> 16) as u16);
        pitch_accu &= 0xFFFF;
    }

    for k in 0..4u16 {
        let s = mem.dmem.i16(sample_addr(ipos.wrapping_add(k)));
        mem.rdram.set_i16(address.wrapping_add(u32::from(k) * 2), s);
    }
    mem.rdram.set_u16(address.wrapping_add(8), pitch_accu as u16);
}

/// Zero-order-hold resampler; the accumulator comes from the caller and is not saved.
pub fn resample_zoh(
    mem: &mut RspMemory,
    dmemo: u16,
    dmemi: u16,
    count: u16,
    pitch: u32,
    pitch_accu: u32,
) {
    let mut ipos = dmemi >> 1;
    let mut opos = dmemo >> 1;
    let mut pitch_accu = pitch_accu;

    for _ in 0..(count >> 1) {
        let s = mem.dmem.i16(sample_addr(ipos));
        mem.dmem.set_i16(sample_addr(opos), s);
        opos = opos.wrapping_add(1);

        pitch_accu = pitch_accu.wrapping_add(pitch);
        ipos = ipos.wrapping_add((pitch_accu >> 16) as u16);
        pitch_accu &= 0xFFFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_is_mirrored() {
        assert_eq!(lut_taps(0), [0x0c39, 0x66ad, 0x0d46, 0xffdfu16 as i16]);
        assert_eq!(lut_taps(63), [0xffdfu16 as i16, 0x0d46, 0x66ad, 0x0c39]);
        assert_eq!(lut_taps(32), [0xfe9bu16 as i16, 0x420b, 0x424a, 0xfeb4u16 as i16]);
    }

    #[test]
    fn test_zoh_unity_pitch_is_identity() {
        let mut mem = RspMemory::new(0x10000);
        let input: Vec<i16> = (0..32).map(|k| (k * 997 - 12000) as i16).collect();
        mem.dmem.store_i16(&input, 0x400);

        resample_zoh(&mut mem, 0x800, 0x400, 64, 0x1_0000, 0);

        let mut out = vec![0i16; 32];
        mem.dmem.load_i16(&mut out, 0x800);
        assert_eq!(out, input);
    }

    #[test]
    fn test_zoh_half_pitch_repeats_samples() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_i16(&[10, 20, 30], 0x400);

        resample_zoh(&mut mem, 0x800, 0x400, 12, 0x8000, 0);

        let mut out = [0i16; 6];
        mem.dmem.load_i16(&mut out, 0x800);
        assert_eq!(out, [10, 10, 20, 20, 30, 30]);
    }

    #[test]
    fn test_resample_init_unity_pitch() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_i16(&[0x1000; 8], 0x400);
        mem.dmem.store_i16(&[0x7777; 4], 0x400 - 8);

        resample(&mut mem, true, false, 0x800, 0x400, 4, 0x1_0000, 0x3000);

        // history zeroed: the first output only sees history, the second
        // sees x[0] at tap 3
        let tap3 = 0xffdfu16 as i16 as i32;
        assert_eq!(mem.dmem.i16(0x800), 0);
        assert_eq!(mem.dmem.i16(0x802) as i32, (0x1000 * tap3) >> 15);

        // two input samples consumed: history is x[-2..2], accumulator is 0
        let mut saved = [0i16; 4];
        mem.rdram.load_i16(&mut saved, 0x3000);
        assert_eq!(saved, [0, 0, 0x1000, 0x1000]);
        assert_eq!(mem.rdram.u16(0x3008), 0);
    }

    #[test]
    fn test_resample_restores_state() {
        let mut mem = RspMemory::new(0x10000);
        mem.rdram.store_i16(&[1000, 2000, 3000, 4000], 0x3000);
        mem.rdram.set_u16(0x3008, 0x8000);

        resample(&mut mem, false, false, 0x800, 0x400, 2, 0, 0x3000);

        // history restored in front of the input
        let mut history = [0i16; 4];
        mem.dmem.load_i16(&mut history, 0x400 - 8);
        assert_eq!(history, [1000, 2000, 3000, 4000]);

        let taps = lut_taps(0x20);
        let expected: i32 = [1000, 2000, 3000, 4000]
            .iter()
            .zip(taps.iter())
            .map(|(&x, &t)| x * t as i32)
            .sum();
        assert_eq!(mem.dmem.i16(0x800), clamp_s16(expected >> 15));
        assert_eq!(mem.rdram.u16(0x3008), 0x8000);
    }
}
