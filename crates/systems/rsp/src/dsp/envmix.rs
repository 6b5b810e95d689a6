//! Envelope-driven mixing into dry (and wet) output buffers.
//!
//! Two styles exist. The generic mixers ramp a left and a right volume
//! toward a target (exponentially or linearly) and keep their state in an
//! 80-byte block in RDRAM. The nead mixer takes externally supplied
//! envelope values and steps and keeps no state of its own.

use super::{align, clamp_s16, sadd};
use crate::memory::RspMemory;

/// Size of the envelope save block in RDRAM
pub const ENVMIX_STATE_SIZE: usize = 80;

// Save block layout (big-endian)
const SAVE_WET: u32 = 0;
const SAVE_DRY: u32 = 4;
const SAVE_TARGET: u32 = 8;
const SAVE_RATE: u32 = 16;
const SAVE_SEQ: u32 = 24;
const SAVE_VALUE: u32 = 32;

/// A Q16.16 volume moving toward a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Ramp {
    value: i64,
    step: i64,
    target: i64,
}

impl Ramp {
    /// Advance one sample and return the integer volume.
    fn step(&mut self) -> i16 {
        self.value += self.step;
        let reached = if self.step <= 0 {
            self.value <= self.target
        } else {
            self.value >= self.target
        };
        if reached {
            self.value = self.target;
            self.step = 0;
        }
        (self.value >> 16) as i16
    }
}

/// DMEM offsets of the input and the four outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvmixBuffers {
    pub dry_left: u16,
    pub dry_right: u16,
    pub wet_left: u16,
    pub wet_right: u16,
    pub input: u16,
}

/// Volume, target and rate for the left (0) and right (1) ramps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvmixParams {
    pub dry: i16,
    pub wet: i16,
    pub vol: [i16; 2],
    pub target: [i16; 2],
    pub rate: [i32; 2],
}

#[inline]
fn gain(volume: i16, level: i16) -> i16 {
    clamp_s16((volume as i32 * level as i32 + 0x4000) >> 15)
}

/// Mix `src` into the first `n` outputs at sample index `k`.
fn mix_sample(mem: &mut RspMemory, outputs: &[u16; 4], gains: &[i16; 4], n: usize, k: u16, src: i16) {
    for (&base, &g) in outputs.iter().zip(gains.iter()).take(n) {
        let addr = u32::from(base.wrapping_add(k << 1));
        let dst = mem.dmem.i16(addr) as i32;
        mem.dmem
            .set_i16(addr, clamp_s16(dst + ((src as i32 * g as i32) >> 15)));
    }
}

fn load_block(mem: &RspMemory, init: bool, address: u32) -> [u8; ENVMIX_STATE_SIZE] {
    let mut block = [0u8; ENVMIX_STATE_SIZE];
    if !init {
        mem.rdram.load_u8(&mut block, address);
    }
    block
}

fn block_i16(block: &[u8; ENVMIX_STATE_SIZE], offset: u32) -> i16 {
    let o = offset as usize;
    i16::from_be_bytes([block[o], block[o + 1]])
}

fn block_i32(block: &[u8; ENVMIX_STATE_SIZE], offset: u32) -> i32 {
    let o = offset as usize;
    i32::from_be_bytes([block[o], block[o + 1], block[o + 2], block[o + 3]])
}

fn set_block_i16(block: &mut [u8; ENVMIX_STATE_SIZE], offset: u32, value: i16) {
    let o = offset as usize;
    block[o..o + 2].copy_from_slice(&value.to_be_bytes());
}

fn set_block_i32(block: &mut [u8; ENVMIX_STATE_SIZE], offset: u32, value: i32) {
    let o = offset as usize;
    block[o..o + 4].copy_from_slice(&value.to_be_bytes());
}

/// Exponential-ramp envelope mixer; `count` is in bytes.
///
/// Mixes into dry L/R, plus wet L/R when `aux` is set.
pub fn envmix_exp(
    mem: &mut RspMemory,
    init: bool,
    aux: bool,
    buffers: &EnvmixBuffers,
    count: u16,
    params: &EnvmixParams,
    address: u32,
) {
    let n = if aux { 4 } else { 2 };
    let mut block = load_block(mem, init, address);
    let mut ramps = [Ramp::default(); 2];
    let mut exp_seq = [0i32; 2];
    let mut exp_rates = [0i32; 2];
    let (mut dry, mut wet) = (params.dry, params.wet);

    if init {
        for i in 0..2 {
            ramps[i].value = i64::from(params.vol[i]) << 16;
            ramps[i].target = i64::from(params.target[i]) << 16;
            exp_rates[i] = params.rate[i];
            exp_seq[i] = i32::from(params.vol[i]).wrapping_mul(params.rate[i]);
        }
    } else {
        wet = block_i16(&block, SAVE_WET);
        dry = block_i16(&block, SAVE_DRY);
        for i in 0..2 {
            let o = 4 * i as u32;
            ramps[i].target = i64::from(block_i32(&block, SAVE_TARGET + o));
            exp_rates[i] = block_i32(&block, SAVE_RATE + o);
            exp_seq[i] = block_i32(&block, SAVE_SEQ + o);
            ramps[i].value = i64::from(block_i32(&block, SAVE_VALUE + o));
        }
    }

    // a ramp is active iff it has not reached its target
    for ramp in ramps.iter_mut() {
        ramp.step = ramp.target - ramp.value;
    }

    let outputs = [
        buffers.dry_left,
        buffers.dry_right,
        buffers.wet_left,
        buffers.wet_right,
    ];
    let mut ptr: u16 = 0;
    for _ in (0..count).step_by(16) {
        for i in 0..2 {
            if ramps[i].step != 0 {
                exp_seq[i] = ((i64::from(exp_seq[i]) * i64::from(exp_rates[i])) >> 16) as i32;
                ramps[i].step = (i64::from(exp_seq[i]) - ramps[i].value) >> 3;
            }
        }

        for _ in 0..8 {
            let l_vol = ramps[0].step();
            let r_vol = ramps[1].step();
            let gains = [
                gain(l_vol, dry),
                gain(r_vol, dry),
                gain(l_vol, wet),
                gain(r_vol, wet),
            ];
            let src = mem.dmem.i16(u32::from(buffers.input.wrapping_add(ptr << 1)));
            mix_sample(mem, &outputs, &gains, n, ptr, src);
            ptr = ptr.wrapping_add(1);
        }
    }

    set_block_i16(&mut block, SAVE_WET, wet);
    set_block_i16(&mut block, SAVE_DRY, dry);
    for i in 0..2 {
        let o = 4 * i as u32;
        set_block_i32(&mut block, SAVE_TARGET + o, ramps[i].target as i32);
        set_block_i32(&mut block, SAVE_RATE + o, exp_rates[i]);
        set_block_i32(&mut block, SAVE_SEQ + o, exp_seq[i]);
        set_block_i32(&mut block, SAVE_VALUE + o, ramps[i].value as i32);
    }
    mem.rdram.store_u8(&block, address);
}

/// Linear-ramp envelope mixer into all four outputs; `count` is in bytes.
///
/// The per-sample step is `rate / 8`. Targets are saved as integer volumes.
pub fn envmix_lin(
    mem: &mut RspMemory,
    init: bool,
    buffers: &EnvmixBuffers,
    count: u16,
    params: &EnvmixParams,
    address: u32,
) {
    let mut block = load_block(mem, init, address);
    let mut ramps = [Ramp::default(); 2];
    let (mut dry, mut wet) = (params.dry, params.wet);

    if init {
        for i in 0..2 {
            ramps[i].step = i64::from(params.rate[i] / 8);
            ramps[i].value = i64::from(params.vol[i]) << 16;
            ramps[i].target = i64::from(params.target[i]) << 16;
        }
    } else {
        wet = block_i16(&block, SAVE_WET);
        dry = block_i16(&block, SAVE_DRY);
        for i in 0..2 {
            let o = 4 * i as u32;
            ramps[i].target = i64::from(block_i16(&block, SAVE_TARGET + o)) << 16;
            ramps[i].step = i64::from(block_i32(&block, SAVE_RATE + o));
            ramps[i].value = i64::from(block_i32(&block, SAVE_VALUE + o));
        }
    }

    let outputs = [
        buffers.dry_left,
        buffers.dry_right,
        buffers.wet_left,
        buffers.wet_right,
    ];
    for k in 0..(count >> 1) {
        let l_vol = ramps[0].step();
        let r_vol = ramps[1].step();
        let gains = [
            gain(l_vol, dry),
            gain(r_vol, dry),
            gain(l_vol, wet),
            gain(r_vol, wet),
        ];
        let src = mem.dmem.i16(u32::from(buffers.input.wrapping_add(k << 1)));
        mix_sample(mem, &outputs, &gains, 4, k, src);
    }

    set_block_i16(&mut block, SAVE_WET, wet);
    set_block_i16(&mut block, SAVE_DRY, dry);
    for i in 0..2 {
        let o = 4 * i as u32;
        set_block_i16(&mut block, SAVE_TARGET + o, (ramps[i].target >> 16) as i16);
        set_block_i32(&mut block, SAVE_RATE + o, ramps[i].step as i32);
        set_block_i32(&mut block, SAVE_VALUE + o, ramps[i].value as i32);
    }
    mem.rdram.store_u8(&block, address);
}

#[inline]
fn nead_scale(x: i16, env: u16) -> i16 {
    ((x as i32 as u32).wrapping_mul(u32::from(env)) >> 16) as i16
}

/// Nead-family envelope mixer; `count` is in samples, rounded up to 8.
///
/// `env_values[0..2]` are the left/right dry gains and `env_values[2]` the
/// wet gain (unsigned Q0.16); `xors` flip the sign of each output. The
/// values advance by `env_steps` after every 8 samples and are written back.
#[allow(clippy::too_many_arguments)]
pub fn envmix_nead(
    mem: &mut RspMemory,
    swap_wet_lr: bool,
    buffers: &EnvmixBuffers,
    count: u16,
    env_values: &mut [u16; 3],
    env_steps: &[u16; 3],
    xors: &[i16; 4],
) {
    let (wl, wr) = if swap_wet_lr {
        (buffers.wet_right, buffers.wet_left)
    } else {
        (buffers.wet_left, buffers.wet_right)
    };
    let outputs = [buffers.dry_left, buffers.dry_right, wl, wr];

    let mut k: u16 = 0;
    let mut remaining = align(count, 8);
    while remaining != 0 {
        for _ in 0..8 {
            let offset = k << 1;
            let input = mem.dmem.i16(u32::from(buffers.input.wrapping_add(offset)));
            let l = nead_scale(input, env_values[0]) ^ xors[0];
            let r = nead_scale(input, env_values[1]) ^ xors[1];
            let l2 = nead_scale(l, env_values[2]) ^ xors[2];
            let r2 = nead_scale(r, env_values[2]) ^ xors[3];

            for (&base, v) in outputs.iter().zip([l, r, l2, r2]) {
                let addr = u32::from(base.wrapping_add(offset));
                let dst = mem.dmem.i16(addr);
                mem.dmem.set_i16(addr, sadd(dst, v));
            }
            k = k.wrapping_add(1);
        }
        for (value, &step) in env_values.iter_mut().zip(env_steps) {
            *value = value.wrapping_add(step);
        }
        remaining -= 8;
    }
}
