//! VADPCM decoding.
//!
//! A frame is one header byte (scale in the high nibble, predictor index in
//! the low nibble) followed by 16 residuals packed as 4-bit nibbles (8 bytes)
//! or 2-bit crumbs (4 bytes). Each 8-sample half is reconstructed with an
//! order-2 predictor taken from the codebook.

use super::{clamp_s16, rdot};
use crate::memory::RspMemory;

/// Codebook entries addressable by a 4-bit predictor index (16 predictors of 16 taps)
pub const CODEBOOK_LEN: usize = 0x100;

#[inline]
fn predict_sample(byte: u8, mask: u8, lshift: u32, rshift: u32) -> i16 {
    let sample = (u16::from(byte & mask) << lshift) as i16;
    sample >> rshift
}

/// Unpack 16 4-bit residuals, returns the number of bytes consumed.
fn predict_frame_4bits(mem: &RspMemory, dst: &mut [i16; 16], dmemi: u16, scale: u8) -> u16 {
    let rshift = if scale < 12 { 12 - u32::from(scale) } else { 0 };
    for i in 0..8 {
        let byte = mem.dmem.u8(u32::from(dmemi.wrapping_add(i as u16)));
        dst[2 * i] = predict_sample(byte, 0xF0, 8, rshift);
        dst[2 * i + 1] = predict_sample(byte, 0x0F, 12, rshift);
    }
    8
}

/// Unpack 16 2-bit residuals, returns the number of bytes consumed.
fn predict_frame_2bits(mem: &RspMemory, dst: &mut [i16; 16], dmemi: u16, scale: u8) -> u16 {
    let rshift = if scale < 14 { 14 - u32::from(scale) } else { 0 };
    for i in 0..4 {
        let byte = mem.dmem.u8(u32::from(dmemi.wrapping_add(i as u16)));
        dst[4 * i] = predict_sample(byte, 0xC0, 8, rshift);
        dst[4 * i + 1] = predict_sample(byte, 0x30, 10, rshift);
        dst[4 * i + 2] = predict_sample(byte, 0x0C, 12, rshift);
        dst[4 * i + 3] = predict_sample(byte, 0x03, 14, rshift);
    }
    4
}

/// Reconstruct 8 samples from residuals `src` and the two previous outputs.
fn compute_residuals(dst: &mut [i16], src: &[i16], cb_entry: &[i16], last: (i16, i16)) {
    let (book1, book2) = cb_entry.split_at(8);
    let (l1, l2) = (last.0 as i32, last.1 as i32);
    for i in 0..8 {
        let accu = ((src[i] as i32) << 11)
            .wrapping_add(book1[i] as i32 * l1)
            .wrapping_add(book2[i] as i32 * l2)
            .wrapping_add(rdot(&book2[..i], src));
        dst[i] = clamp_s16(accu >> 11);
    }
}

/// Where the decoder's 16-sample history comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdpcmHistory {
    /// Start from silence
    Init,
    /// Continue from the frame saved at `last_frame_address`
    Continue,
    /// Restart from the loop frame at `loop_address`
    Loop,
}

/// Decode `count / 32` frames from `dmemi` into `dmemo`.
///
/// The 16-sample history frame is written to `dmemo` first, so the output
/// occupies `32 + count` bytes. The last decoded frame is saved to
/// `last_frame_address`.
#[allow(clippy::too_many_arguments)]
pub fn decode(
    mem: &mut RspMemory,
    history: AdpcmHistory,
    two_bit_per_sample: bool,
    dmemo: u16,
    dmemi: u16,
    count: u16,
    codebook: &[i16; CODEBOOK_LEN],
    loop_address: u32,
    last_frame_address: u32,
) {
    let mut last_frame = [0i16; 16];
    match history {
        AdpcmHistory::Init => {}
        AdpcmHistory::Continue => mem.rdram.load_i16(&mut last_frame, last_frame_address),
        AdpcmHistory::Loop => mem.rdram.load_i16(&mut last_frame, loop_address),
    }

    let (mut dmemo, mut dmemi) = (dmemo, dmemi);
    mem.dmem.store_i16(&last_frame, u32::from(dmemo));
    dmemo = dmemo.wrapping_add(32);

    let mut remaining = count;
    while remaining >= 32 {
        let code = mem.dmem.u8(u32::from(dmemi));
        dmemi = dmemi.wrapping_add(1);
        let scale = code >> 4;
        let entry = usize::from(code & 0x0F) << 4;
        let cb_entry = &codebook[entry..entry + 16];

        let mut frame = [0i16; 16];
        dmemi = dmemi.wrapping_add(if two_bit_per_sample {
            predict_frame_2bits(mem, &mut frame, dmemi, scale)
        } else {
            predict_frame_4bits(mem, &mut frame, dmemi, scale)
        });

        let first_last = (last_frame[14], last_frame[15]);
        compute_residuals(&mut last_frame[..8], &frame[..8], cb_entry, first_last);
        let second_last = (last_frame[6], last_frame[7]);
        compute_residuals(&mut last_frame[8..], &frame[8..], cb_entry, second_last);

        mem.dmem.store_i16(&last_frame, u32::from(dmemo));
        dmemo = dmemo.wrapping_add(32);
        remaining -= 32;
    }

    mem.rdram.store_i16(&last_frame, last_frame_address);
}

#[cfg(test)]
mod tests {
    use super::*;

    const IN: u16 = 0x400;
    const OUT: u16 = 0x800;
    const STATE: u32 = 0x1000;

    fn output(mem: &RspMemory, frames: usize) -> Vec<i16> {
        let mut out = vec![0i16; 16 * (frames + 1)];
        mem.dmem.load_i16(&mut out, u32::from(OUT));
        out
    }

    #[test]
    fn test_zero_codebook_decodes_scaled_nibbles() {
        let mut mem = RspMemory::new(0x10000);
        // scale 3, predictor 0; nibbles 1, -1 (0xF), 7, -8 (0x8), then zeros
        mem.dmem
            .store_u8(&[0x30, 0x1F, 0x78, 0, 0, 0, 0, 0, 0], u32::from(IN));
        let codebook = [0i16; CODEBOOK_LEN];

        decode(
            &mut mem,
            AdpcmHistory::Init,
            false,
            OUT,
            IN,
            32,
            &codebook,
            0,
            STATE,
        );

        let out = output(&mem, 1);
        assert!(out[..16].iter().all(|&s| s == 0));
        assert_eq!(&out[16..20], &[8, -8, 56, -64]);
        assert!(out[20..].iter().all(|&s| s == 0));

        let mut saved = [0i16; 16];
        mem.rdram.load_i16(&mut saved, STATE);
        assert_eq!(&saved[..], &out[16..]);
    }

    #[test]
    fn test_scale_above_twelve_does_not_shift_right() {
        let mut mem = RspMemory::new(0x10000);
        mem.dmem.store_u8(&[0xD0, 0x10], u32::from(IN));
        decode(
            &mut mem,
            AdpcmHistory::Init,
            false,
            OUT,
            IN,
            32,
            &[0; CODEBOOK_LEN],
            0,
            STATE,
        );
        // 1 << 12, no right shift
        assert_eq!(mem.dmem.i16(u32::from(OUT) + 32), 0x1000);
    }

    #[test]
    fn test_two_bit_residuals() {
        let mut mem = RspMemory::new(0x10000);
        // scale 14 -> rshift 0; crumbs 01 11 10 00
        mem.dmem.store_u8(&[0xE0, 0b0111_1000], u32::from(IN));
        decode(
            &mut mem,
            AdpcmHistory::Init,
            true,
            OUT,
            IN,
            32,
            &[0; CODEBOOK_LEN],
            0,
            STATE,
        );
        let out = output(&mem, 1);
        assert_eq!(&out[16..20], &[0x4000, -0x4000, -0x8000, 0]);
    }

    #[test]
    fn test_predictor_uses_history_and_in_frame_samples() {
        let mut mem = RspMemory::new(0x10000);
        // residual 1 << 11 in sample 0 only (scale 11 -> rshift 1; nibble 1 << 12 >> 1)
        mem.dmem.store_u8(&[0xB1, 0x10], u32::from(IN));

        let mut codebook = [0i16; CODEBOOK_LEN];
        // predictor 1: book1 = all 0x800 (0.5 of l1), book2 = [0x400, ...]
        codebook[16..24].fill(0x800);
        codebook[24..32].fill(0x400);

        let mut history = [0i16; 16];
        history[14] = 100;
        history[15] = 200;
        mem.rdram.store_i16(&history, STATE);

        decode(
            &mut mem,
            AdpcmHistory::Continue,
            false,
            OUT,
            IN,
            32,
            &codebook,
            0,
            STATE,
        );

        let out = output(&mem, 1);
        assert_eq!(&out[..16], &history[..]);

        // i = 0: (0x800 << 11 + 0x800*100 + 0x400*200) >> 11 = 2048 + 100 + 100
        assert_eq!(out[16], 2248);
        // i = 1: (0x800*100 + 0x400*200 + book2[0]*src[0]) >> 11
        //      = (409600 + 0x400 * 0x800) >> 11 = 200 + 1024
        assert_eq!(out[17], 1224);
        // second half uses out[6], out[7] of the freshly decoded half
        let l1 = out[16 + 6] as i32;
        let l2 = out[16 + 7] as i32;
        assert_eq!(out[24] as i32, (0x800 * l1 + 0x400 * l2) >> 11);
    }

    #[test]
    fn test_loop_history_comes_from_loop_address() {
        let mut mem = RspMemory::new(0x10000);
        let loop_frame: Vec<i16> = (1..=16).collect();
        mem.rdram.store_i16(&loop_frame, 0x2000);
        mem.rdram.store_i16(&[99; 16], STATE);

        decode(
            &mut mem,
            AdpcmHistory::Loop,
            false,
            OUT,
            IN,
            0,
            &[0; CODEBOOK_LEN],
            0x2000,
            STATE,
        );

        let out = output(&mem, 0);
        assert_eq!(out, loop_frame);
        // zero frames decoded: the loop frame becomes the saved frame
        let mut saved = [0i16; 16];
        mem.rdram.load_i16(&mut saved, STATE);
        assert_eq!(saved.to_vec(), loop_frame);
    }
}
