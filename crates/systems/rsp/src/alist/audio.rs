//! Standard audio ABI.
//!
//! DMEM operands are relative to [`DMEM_BASE`]. RDRAM operands are
//! `segment << 24 | offset` and are relocated through a 16-entry segment
//! table set by the SEGMENT command.

use super::{spnoop, AlistContext, Dialect, Handler};
use crate::dsp::adpcm::{self, AdpcmHistory};
use crate::dsp::envmix::{self, EnvmixBuffers, EnvmixParams};
use crate::dsp::{align, buffer, filter, mix, resample};
use hle_core::logging::{log, LogCategory, LogLevel};

/// Start of the audio buffers in DMEM
pub const DMEM_BASE: u16 = 0x5C0;

/// Command flag bits
pub const A_INIT: u8 = 0x01;
pub const A_LOOP: u8 = 0x02;
pub const A_LEFT: u8 = 0x02;
pub const A_VOL: u8 = 0x04;
pub const A_AUX: u8 = 0x08;

const N_SEGMENTS: usize = 16;

#[inline]
fn flags(w1: u32) -> u8 {
    (w1 >> 16) as u8
}

#[inline]
fn base(offset: u32) -> u16 {
    (offset as u16).wrapping_add(DMEM_BASE)
}

/// Relocate a segmented RDRAM address.
pub fn get_address(segments: &[u32; N_SEGMENTS], so: u32) -> u32 {
    let segment = ((so >> 24) & 0x3F) as usize;
    let offset = so & 0x00FF_FFFF;
    match segments.get(segment) {
        Some(&base) => base.wrapping_add(offset),
        None => {
            log(LogCategory::Alist, LogLevel::Warn, || {
                format!("Invalid segment {}", segment)
            });
            offset
        }
    }
}

fn address(ctx: &AlistContext<'_>, so: u32) -> u32 {
    get_address(&ctx.state.segments, so)
}

fn history(flags: u8) -> AdpcmHistory {
    if flags & A_INIT != 0 {
        AdpcmHistory::Init
    } else if flags & A_LOOP != 0 {
        AdpcmHistory::Loop
    } else {
        AdpcmHistory::Continue
    }
}

fn envmix_setup(ctx: &AlistContext<'_>) -> (EnvmixBuffers, EnvmixParams) {
    let s = &ctx.state;
    (
        EnvmixBuffers {
            dry_left: s.out_buf,
            dry_right: s.dry_right,
            wet_left: s.wet_left,
            wet_right: s.wet_right,
            input: s.in_buf,
        },
        EnvmixParams {
            dry: s.dry,
            wet: s.wet,
            vol: s.vol,
            target: s.target,
            rate: s.rate,
        },
    )
}

fn clearbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmem = base(w1);
    let count = (w2 & 0xFFF) as u16;
    if count == 0 {
        return;
    }
    buffer::clear(ctx.mem, dmem, align(count, 16));
}

fn envmixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = flags(w1);
    let address = address(ctx, w2);
    let (buffers, params) = envmix_setup(ctx);
    envmix::envmix_exp(
        ctx.mem,
        flags & A_INIT != 0,
        flags & A_AUX != 0,
        &buffers,
        ctx.state.count,
        &params,
        address,
    );
}

fn envmixer_ge(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = flags(w1);
    let address = address(ctx, w2);
    let (buffers, params) = envmix_setup(ctx);
    envmix::envmix_lin(
        ctx.mem,
        flags & A_INIT != 0,
        &buffers,
        ctx.state.count,
        &params,
        address,
    );
}

fn resample(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = flags(w1);
    let pitch = u32::from(w1 as u16) << 1;
    let address = address(ctx, w2);
    resample::resample(
        ctx.mem,
        flags & 0x1 != 0,
        flags & 0x2 != 0,
        ctx.state.out_buf,
        ctx.state.in_buf,
        align(ctx.state.count, 16),
        pitch,
        address,
    );
}

fn setvol(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = flags(w1);
    let s = &mut ctx.state;
    if flags & A_AUX != 0 {
        s.dry = w1 as i16;
        s.wet = w2 as i16;
    } else {
        let lr = if flags & A_LEFT != 0 { 0 } else { 1 };
        if flags & A_VOL != 0 {
            s.vol[lr] = w1 as i16;
        } else {
            s.target[lr] = w1 as i16;
            s.rate[lr] = w2 as i32;
        }
    }
}

fn dmemmove(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmemi = base(w1);
    let dmemo = base(w2 >> 16);
    let count = w2 as u16;
    if count == 0 {
        return;
    }
    buffer::dmem_move(ctx.mem, dmemo, dmemi, align(count, 16));
}

fn loadadpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = w1 as u16;
    let address = address(ctx, w2);
    ctx.state
        .load_codebook(ctx.mem, address, usize::from(align(count, 8) >> 1));
}

fn interleave(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    let left = base(w2 >> 16);
    let right = base(w2);
    if ctx.state.count == 0 {
        return;
    }
    buffer::interleave(
        ctx.mem,
        ctx.state.out_buf,
        left,
        right,
        align(ctx.state.count, 16),
    );
}

fn mixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let gain = w1 as i16;
    let dmemi = base(w2 >> 16);
    let dmemo = base(w2);
    if ctx.state.count == 0 {
        return;
    }
    mix::mix(ctx.mem, dmemo, dmemi, align(ctx.state.count, 32), gain);
}

fn segment(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    let segment = ((w2 >> 24) & 0x3F) as usize;
    match ctx.state.segments.get_mut(segment) {
        Some(base) => *base = w2 & 0x00FF_FFFF,
        None => log(LogCategory::Alist, LogLevel::Warn, || {
            format!("SEGMENT: invalid segment {}", segment)
        }),
    }
}

fn setbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let s = &mut ctx.state;
    if flags(w1) & A_AUX != 0 {
        s.dry_right = base(w1);
        s.wet_left = base(w2 >> 16);
        s.wet_right = base(w2);
    } else {
        s.in_buf = base(w1);
        s.out_buf = base(w2 >> 16);
        s.count = w2 as u16;
    }
}

fn setloop(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    ctx.state.loop_address = address(ctx, w2);
}

fn adpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let address = address(ctx, w2);
    adpcm::decode(
        ctx.mem,
        history(flags(w1)),
        false,
        ctx.state.out_buf,
        ctx.state.in_buf,
        align(ctx.state.count, 32),
        &ctx.state.table,
        ctx.state.loop_address,
        address,
    );
}

fn loadbuff(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    let address = address(ctx, w2);
    if ctx.state.count == 0 {
        return;
    }
    buffer::load(ctx.mem, ctx.state.in_buf, address, ctx.state.count);
}

fn savebuff(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    let address = address(ctx, w2);
    if ctx.state.count == 0 {
        return;
    }
    buffer::save(ctx.mem, ctx.state.out_buf, address, ctx.state.count);
}

fn polef(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = flags(w1);
    let gain = w1 as u16;
    let address = address(ctx, w2);
    if ctx.state.count == 0 {
        return;
    }
    let (out_buf, in_buf, count) = (ctx.state.out_buf, ctx.state.in_buf, ctx.state.count);
    filter::polef(
        ctx.mem,
        flags & A_INIT != 0,
        out_buf,
        in_buf,
        align(count, 16),
        gain,
        &mut ctx.state.table,
        address,
    );
}

/// Slot assignment for the standard ABI; only the envelope mixer differs
/// between dialects.
pub(crate) fn handlers(dialect: Dialect) -> [Handler; 16] {
    let envmix: Handler = match dialect {
        Dialect::AudioGe | Dialect::AudioBc => envmixer_ge,
        _ => envmixer,
    };
    [
        spnoop, adpcm, clearbuff, envmix, loadbuff, resample, savebuff, segment, setbuff,
        setvol, dmemmove, loadadpcm, mixer, interleave, polef, setloop,
    ]
}
