//! FIR and pole filters, processed in blocks of 8 samples.

use super::adpcm::CODEBOOK_LEN;
use super::{align, clamp_s16, rdot};
use crate::memory::RspMemory;

/// 8-tap FIR over `count` bytes at `dmem`, in place.
///
/// The two coefficient tables at `lut_address` are averaged into each other
/// in RDRAM first. The 8 samples at `address` are the history preceding the
/// block; the last 8 input samples replace them.
pub fn filter(mem: &mut RspMemory, dmem: u16, count: u16, address: u32, lut_address: [u32; 2]) {
    let mut lut = [0i16; 8];
    for (x, tap) in lut.iter_mut().enumerate() {
        let a6 = lut_address[0].wrapping_add(2 * x as u32);
        let a5 = lut_address[1].wrapping_add(2 * x as u32);
        let v = ((mem.rdram.i16(a5) as i32 + mem.rdram.i16(a6) as i32) >> 1) as i16;
        mem.rdram.set_i16(a5, v);
        mem.rdram.set_i16(a6, v);
        *tap = v;
    }

    let blocks = usize::from(count).div_ceil(16);
    let mut input = vec![0i16; 8 + 8 * blocks];
    mem.rdram.load_i16(&mut input[..8], address);
    mem.dmem.load_i16(&mut input[8..], u32::from(dmem));

    let mut output = vec![0i16; 8 * blocks];
    for (n, out) in output.iter_mut().enumerate() {
        // input[n + 8] is x[n], input[n + 8 - k] is x[n - k]
        let v = lut.iter().enumerate().fold(0i32, |accu, (k, &tap)| {
            accu.wrapping_add(tap as i32 * input[n + 8 - k] as i32)
        });
        *out = (v.wrapping_add(0x4000) >> 15) as i16;
    }

    let tail = input.len() - 8;
    mem.rdram.store_i16(&input[tail..], address);
    mem.dmem.store_i16(&output[..usize::from(count >> 1).min(output.len())], u32::from(dmem));
}

/// Two-pole IIR filter with gain, `count` bytes rounded up to 16.
///
/// The coefficients share the ADPCM codebook storage: `table[0..8]` holds
/// the first-order terms and `table[8..16]` the second-order terms; the
/// latter are rescaled by `gain` in place. On `init` the two previous
/// outputs start at zero, otherwise they are read from `address + 4`. The
/// last four outputs are saved to `address`.
#[allow(clippy::too_many_arguments)]
pub fn polef(
    mem: &mut RspMemory,
    init: bool,
    dmemo: u16,
    dmemi: u16,
    count: u16,
    gain: u16,
    table: &mut [i16; CODEBOOK_LEN],
    address: u32,
) {
    let count = align(count, 16);
    if count == 0 {
        return;
    }

    let (mut l1, mut l2) = if init {
        (0i32, 0i32)
    } else {
        (
            mem.rdram.i16(address.wrapping_add(4)) as i32,
            mem.rdram.i16(address.wrapping_add(6)) as i32,
        )
    };

    let mut h2_before = [0i16; 8];
    h2_before.copy_from_slice(&table[8..16]);
    for h in table[8..16].iter_mut() {
        *h = ((*h as i32 * i32::from(gain)) >> 14) as i16;
    }
    let (h1, h2) = (&table[..8], &table[8..16]);

    let (mut dmemo, mut dmemi) = (dmemo, dmemi);
    let mut out = [0i16; 8];
    for _ in 0..(count >> 4) {
        let mut frame = [0i16; 8];
        mem.dmem.load_i16(&mut frame, u32::from(dmemi));
        dmemi = dmemi.wrapping_add(16);

        for i in 0..8 {
            let accu = (frame[i] as i32 * i32::from(gain))
                .wrapping_add(h1[i] as i32 * l1)
                .wrapping_add(h2_before[i] as i32 * l2)
                .wrapping_add(rdot(&h2[..i], &frame));
            out[i] = clamp_s16(accu >> 14);
        }
        mem.dmem.store_i16(&out, u32::from(dmemo));
        dmemo = dmemo.wrapping_add(16);

        l1 = out[6] as i32;
        l2 = out[7] as i32;
    }

    mem.rdram.store_i16(&out[4..], address);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_averages_luts_and_keeps_history() {
        let mut mem = RspMemory::new(0x10000);
        // lut6 = [0x4000, 0..], lut5 = [0x4000, 0x2000, 0..] -> [0x4000, 0x1000, 0..]
        mem.rdram.store_i16(&[0x4000, 0, 0, 0, 0, 0, 0, 0], 0x1000);
        mem.rdram.store_i16(&[0x4000, 0x2000, 0, 0, 0, 0, 0, 0], 0x1010);
        // history: most recent sample is 800
        mem.rdram.store_i16(&[0, 0, 0, 0, 0, 0, 0, 800], 0x2000);

        let input: Vec<i16> = (1..=8).map(|k| k * 100).collect();
        mem.dmem.store_i16(&input, 0x300);

        filter(&mut mem, 0x300, 16, 0x2000, [0x1000, 0x1010]);

        let mut lut = [0i16; 8];
        mem.rdram.load_i16(&mut lut, 0x1010);
        assert_eq!(&lut[..2], &[0x4000, 0x1000]);
        mem.rdram.load_i16(&mut lut, 0x1000);
        assert_eq!(&lut[..2], &[0x4000, 0x1000]);

        // y[n] = (0x4000 * x[n] + 0x1000 * x[n-1] + 0x4000) >> 15
        let mut out = [0i16; 8];
        mem.dmem.load_i16(&mut out, 0x300);
        let mut prev = 800i32;
        for (n, &x) in input.iter().enumerate() {
            let expected = (0x4000 * x as i32 + 0x1000 * prev + 0x4000) >> 15;
            assert_eq!(out[n] as i32, expected);
            prev = x as i32;
        }

        let mut history = [0i16; 8];
        mem.rdram.load_i16(&mut history, 0x2000);
        assert_eq!(history.to_vec(), input);
    }

    #[test]
    fn test_polef_feedforward_only() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_i16(&[1000, -1000, 0, 0, 0, 0, 0, 0], 0x100);
        let mut table = [0i16; CODEBOOK_LEN];

        // gain 1.0 in Q2.14
        polef(&mut mem, true, 0x200, 0x100, 16, 0x4000, &mut table, 0x3000);

        let mut out = [0i16; 8];
        mem.dmem.load_i16(&mut out, 0x200);
        assert_eq!(out, [1000, -1000, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_polef_feedback_and_state() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_i16(&[0x1000; 8], 0x100);
        mem.rdram.store_i16(&[0, 0, 400, 200], 0x3000);

        let mut table = [0i16; CODEBOOK_LEN];
        table[..8].fill(0x2000); // h1 = 0.5 * l1
        table[8] = 0x4000; // h2[0] = 1.0 (rescaled by the 0.5 gain)

        polef(&mut mem, false, 0x200, 0x100, 16, 0x2000, &mut table, 0x3000);

        // h2 rescaled in place
        assert_eq!(table[8], 0x2000);

        let mut out = [0i16; 8];
        mem.dmem.load_i16(&mut out, 0x200);
        // i = 0: (0x1000*0x2000 + 0x2000*400 + 0x4000*200) >> 14 (h2 before rescale)
        assert_eq!(out[0] as i32, (0x1000 * 0x2000 + 0x2000 * 400 + 0x4000 * 200) >> 14);
        // i = 1: adds h2[0] * frame[0] with the rescaled h2
        assert_eq!(
            out[1] as i32,
            (0x1000 * 0x2000 + 0x2000 * 400 + 0x2000 * 0x1000) >> 14
        );

        let mut saved = [0i16; 4];
        mem.rdram.load_i16(&mut saved, 0x3000);
        assert_eq!(saved, [out[4], out[5], out[6], out[7]]);
    }

    #[test]
    fn test_polef_gain_above_two_stays_positive() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_i16(&[1000; 8], 0x100);
        let mut table = [0i16; CODEBOOK_LEN];
        table[8] = 0x100;

        // 0x8000 is 2.0 in Q2.14
        polef(&mut mem, true, 0x200, 0x100, 16, 0x8000, &mut table, 0x1000);

        assert_eq!(table[8], 0x200);
        let mut out = [0i16; 8];
        mem.dmem.load_i16(&mut out, 0x200);
        assert_eq!(out[0], 2000);
        // later samples add the rescaled h2[0] * frame[0]
        assert_eq!(out[1] as i32, (1000 * 0x8000 + 0x200 * 1000) >> 14);
    }

    #[test]
    fn test_polef_zero_count_is_noop() {
        let mut mem = RspMemory::new(0x10000);
        let mut table = [0x100i16; CODEBOOK_LEN];
        polef(&mut mem, true, 0x200, 0x100, 0, 0x4000, &mut table, 0x3000);
        assert!(table.iter().all(|&h| h == 0x100));
        assert_eq!(mem.rdram.u32(0x3000), 0);
    }
}
