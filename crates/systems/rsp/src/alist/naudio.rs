//! The "naudio" ABI.
//!
//! Buffers live at fixed DMEM offsets and most commands work on a fixed
//! block of [`NAUDIO_COUNT`] bytes. RDRAM addresses are plain 24-bit
//! values.

use super::{spnoop, unknown, AlistContext, Dialect, Handler};
use crate::dsp::adpcm::{self, AdpcmHistory};
use crate::dsp::envmix::{self, EnvmixBuffers, EnvmixParams};
use crate::dsp::{align, buffer, filter, mix, resample};
use hle_core::logging::{log, LogCategory, LogLevel};

pub const NAUDIO_COUNT: u16 = 0x170;
pub const NAUDIO_MAIN: u16 = 0x4F0;
pub const NAUDIO_MAIN2: u16 = 0x660;
pub const NAUDIO_DRY_LEFT: u16 = 0x9D0;
pub const NAUDIO_DRY_RIGHT: u16 = 0xB40;
pub const NAUDIO_WET_LEFT: u16 = 0xCB0;
pub const NAUDIO_WET_RIGHT: u16 = 0xE20;

#[inline]
fn in_main(offset: u32) -> u16 {
    (offset as u16).wrapping_add(NAUDIO_MAIN)
}

fn naudio_0000(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    unknown(ctx, w1, w2);
}

fn naudio_02b0(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    ctx.state.rate[1] = (ctx.state.rate[1] & !0xFFFF) | (w2 & 0xFFFF) as i32;
}

fn naudio_14(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    if ctx.state.table[0] != 0 || ctx.state.table[1] != 0 {
        log(LogCategory::Stubs, LogLevel::Warn, || {
            "NAUDIO_14: non null codebook[0-3] case not implemented".to_string()
        });
        return;
    }

    let flags = (w1 >> 16) as u8;
    let gain = w1 as u16;
    let select_main = (w2 >> 24) as u8;
    let address = w2 & 0x00FF_FFFF;
    let dmem = if select_main == 0 {
        NAUDIO_MAIN
    } else {
        NAUDIO_MAIN2
    };
    filter::polef(
        ctx.mem,
        flags & 0x1 != 0,
        dmem,
        dmem,
        NAUDIO_COUNT,
        gain,
        &mut ctx.state.table,
        address,
    );
}

fn setvol(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let s = &mut ctx.state;
    if flags & 0x4 != 0 {
        if flags & 0x2 != 0 {
            s.vol[0] = w1 as i16;
            s.dry = (w2 >> 16) as i16;
            s.wet = w2 as i16;
        } else {
            s.target[1] = w1 as i16;
            s.rate[1] = w2 as i32;
        }
    } else {
        s.target[0] = w1 as i16;
        s.rate[0] = w2 as i32;
    }
}

fn envmixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let address = w2 & 0x00FF_FFFF;
    ctx.state.vol[1] = w1 as i16;

    let s = &ctx.state;
    let buffers = EnvmixBuffers {
        dry_left: NAUDIO_DRY_LEFT,
        dry_right: NAUDIO_DRY_RIGHT,
        wet_left: NAUDIO_WET_LEFT,
        wet_right: NAUDIO_WET_RIGHT,
        input: NAUDIO_MAIN,
    };
    let params = EnvmixParams {
        dry: s.dry,
        wet: s.wet,
        vol: s.vol,
        target: s.target,
        rate: s.rate,
    };
    envmix::envmix_lin(
        ctx.mem,
        flags & 0x1 != 0,
        &buffers,
        NAUDIO_COUNT,
        &params,
        address,
    );
}

fn clearbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmem = in_main(w1);
    let count = (w2 & 0xFFF) as u16;
    buffer::clear(ctx.mem, dmem, count);
}

fn mixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let gain = w1 as i16;
    let dmemi = in_main(w2 >> 16);
    let dmemo = in_main(w2);
    mix::mix(ctx.mem, dmemo, dmemi, NAUDIO_COUNT, gain);
}

/// `(dmem, count, address)` of the buffer transfer commands
fn transfer_operands(w1: u32, w2: u32) -> (u16, u16, u32) {
    let count = ((w1 >> 12) & 0xFFF) as u16;
    let dmem = in_main(w1 & 0xFFF);
    (dmem, count, w2 & 0x00FF_FFFF)
}

fn loadbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let (dmem, count, address) = transfer_operands(w1, w2);
    buffer::load(ctx.mem, dmem, address, count);
}

fn savebuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let (dmem, count, address) = transfer_operands(w1, w2);
    buffer::save(ctx.mem, dmem, address, count);
}

fn loadadpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = (w1 as u16) >> 1;
    ctx.state
        .load_codebook(ctx.mem, w2 & 0x00FF_FFFF, usize::from(count));
}

fn dmemmove(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmemi = in_main(w1);
    let dmemo = in_main(w2 >> 16);
    let count = (w2 as u16).wrapping_add(3) & !3;
    buffer::dmem_move(ctx.mem, dmemo, dmemi, count);
}

fn setloop(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    ctx.state.loop_address = w2 & 0x00FF_FFFF;
}

fn adpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let address = w1 & 0x00FF_FFFF;
    let flags = (w2 >> 28) as u8;
    let count = ((w2 >> 16) & 0xFFF) as u16;
    let dmemi = in_main((w2 >> 12) & 0xF);
    let dmemo = in_main(w2 & 0xFFF);

    let history = if flags & 0x1 != 0 {
        AdpcmHistory::Init
    } else if flags & 0x2 != 0 {
        AdpcmHistory::Loop
    } else {
        AdpcmHistory::Continue
    };
    // no 2-bit frames in this ucode
    adpcm::decode(
        ctx.mem,
        history,
        false,
        dmemo,
        dmemi,
        align(count, 32),
        &ctx.state.table,
        ctx.state.loop_address,
        address,
    );
}

fn resample(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let address = w1 & 0x00FF_FFFF;
    let flags = (w2 >> 30) as u8;
    let pitch = u32::from((w2 >> 14) as u16) << 1;
    let dmemi = in_main((w2 >> 2) & 0xFFF);
    let dmemo = if w2 & 0x3 != 0 {
        NAUDIO_MAIN2
    } else {
        NAUDIO_MAIN
    };
    resample::resample(
        ctx.mem,
        flags & 0x1 != 0,
        false,
        dmemo,
        dmemi,
        NAUDIO_COUNT,
        pitch,
        address,
    );
}

fn interleave(ctx: &mut AlistContext<'_>, _w1: u32, _w2: u32) {
    buffer::interleave(
        ctx.mem,
        NAUDIO_MAIN,
        NAUDIO_DRY_LEFT,
        NAUDIO_DRY_RIGHT,
        NAUDIO_COUNT,
    );
}

fn mp3addy(_ctx: &mut AlistContext<'_>, _w1: u32, _w2: u32) {}

fn mp3(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let index = w1 & 0x1E;
    let address = (w2 & 0x00FF_FFFF).wrapping_sub(4);
    ctx.host.mp3(index, address, ctx.mem);
}

pub(crate) fn handlers(dialect: Dialect) -> [Handler; 16] {
    match dialect {
        Dialect::NaudioMp3 | Dialect::NaudioCbfd => [
            unknown, adpcm, clearbuff, envmixer, loadbuff, resample, savebuff, mp3, mp3addy,
            setvol, dmemmove, loadadpcm, mixer, interleave, naudio_14, setloop,
        ],
        Dialect::NaudioDk => [
            spnoop, adpcm, clearbuff, envmixer, loadbuff, resample, savebuff, mixer, mixer,
            setvol, dmemmove, loadadpcm, mixer, interleave, naudio_02b0, setloop,
        ],
        _ => [
            spnoop,
            adpcm,
            clearbuff,
            envmixer,
            loadbuff,
            resample,
            savebuff,
            naudio_0000,
            naudio_0000,
            setvol,
            dmemmove,
            loadadpcm,
            mixer,
            interleave,
            naudio_02b0,
            setloop,
        ],
    }
}
