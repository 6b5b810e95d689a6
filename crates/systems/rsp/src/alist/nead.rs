//! The "nead" ABI family.
//!
//! Every command carries its own DMEM addresses; RDRAM addresses are plain
//! 24-bit values. Besides the classic commands the family has a
//! fixed-point envelope mixer driven by ENVSETUP1/ENVSETUP2, a FIR filter
//! and a handful of block copy helpers.

use super::{spnoop, unknown, AlistContext, Dialect, Handler};
use crate::dsp::adpcm::{self, AdpcmHistory};
use crate::dsp::envmix::{self, EnvmixBuffers};
use crate::dsp::{buffer, filter, mix, resample};

#[inline]
fn address(w2: u32) -> u32 {
    w2 & 0x00FF_FFFF
}

fn loadadpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = (w1 as u16) >> 1;
    ctx.state
        .load_codebook(ctx.mem, address(w2), usize::from(count));
}

fn setloop(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    ctx.state.loop_address = address(w2);
}

fn setbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    ctx.state.in_buf = w1 as u16;
    ctx.state.out_buf = (w2 >> 16) as u16;
    ctx.state.count = w2 as u16;
}

fn adpcm(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let history = if flags & 0x1 != 0 {
        AdpcmHistory::Init
    } else if flags & 0x2 != 0 {
        AdpcmHistory::Loop
    } else {
        AdpcmHistory::Continue
    };
    adpcm::decode(
        ctx.mem,
        history,
        flags & 0x4 != 0,
        ctx.state.out_buf,
        ctx.state.in_buf,
        ctx.state.count.wrapping_add(0x1F) & !0x1F,
        &ctx.state.table,
        ctx.state.loop_address,
        address(w2),
    );
}

fn clearbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmem = w1 as u16;
    let count = (w2 & 0xFFF) as u16;
    if count == 0 {
        return;
    }
    buffer::clear(ctx.mem, dmem, count);
}

fn loadbuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = ((w1 >> 12) & 0xFFF) as u16;
    let dmem = (w1 & 0xFFF) as u16;
    buffer::load(ctx.mem, dmem, address(w2), count);
}

fn savebuff(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = ((w1 >> 12) & 0xFFF) as u16;
    let dmem = (w1 & 0xFFF) as u16;
    buffer::save(ctx.mem, dmem, address(w2), count);
}

fn mixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = ((w1 >> 12) & 0xFF0) as u16;
    let gain = w1 as i16;
    let dmemi = (w2 >> 16) as u16;
    let dmemo = w2 as u16;
    mix::mix(ctx.mem, dmemo, dmemi, count, gain);
}

fn resample(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let pitch = u32::from(w1 as u16) << 1;
    resample::resample(
        ctx.mem,
        flags & 0x1 != 0,
        false,
        ctx.state.out_buf,
        ctx.state.in_buf,
        ctx.state.count.wrapping_add(0xF) & !0xF,
        pitch,
        address(w2),
    );
}

fn resample_zoh(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let pitch = (w1 & 0xFFFF) << 1;
    let pitch_accu = w2 & 0xFFFF;
    resample::resample_zoh(
        ctx.mem,
        ctx.state.out_buf,
        ctx.state.in_buf,
        ctx.state.count,
        pitch,
        pitch_accu,
    );
}

fn dmemmove(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let dmemi = w1 as u16;
    let dmemo = (w2 >> 16) as u16;
    let count = w2 as u16;
    if count == 0 {
        return;
    }
    buffer::dmem_move(ctx.mem, dmemo, dmemi, count.wrapping_add(3) & !3);
}

fn envsetup1_mk(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let s = &mut ctx.state;
    s.env_values[2] = ((w1 >> 8) & 0xFF00) as u16;
    s.env_steps[2] = 0;
    s.env_steps[0] = (w2 >> 16) as u16;
    s.env_steps[1] = w2 as u16;
}

fn envsetup1(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let s = &mut ctx.state;
    s.env_values[2] = ((w1 >> 8) & 0xFF00) as u16;
    s.env_steps[2] = w1 as u16;
    s.env_steps[0] = (w2 >> 16) as u16;
    s.env_steps[1] = w2 as u16;
}

fn envsetup2(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    ctx.state.env_values[0] = (w2 >> 16) as u16;
    ctx.state.env_values[1] = w2 as u16;
}

/// -1 when `bit` is set in `w1`, 0 otherwise
#[inline]
fn xor_mask(w1: u32, bit: u32) -> i16 {
    if w1 & bit != 0 {
        -1
    } else {
        0
    }
}

fn envmix_buffers(w1: u32, w2: u32) -> EnvmixBuffers {
    EnvmixBuffers {
        dry_left: ((w2 >> 20) & 0xFF0) as u16,
        dry_right: ((w2 >> 12) & 0xFF0) as u16,
        wet_left: ((w2 >> 4) & 0xFF0) as u16,
        wet_right: ((w2 << 4) & 0xFF0) as u16,
        input: ((w1 >> 12) & 0xFF0) as u16,
    }
}

fn run_envmixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32, swap: bool, xors: [i16; 4]) {
    let count = ((w1 >> 8) & 0xFF) as u16;
    let buffers = envmix_buffers(w1, w2);
    envmix::envmix_nead(
        ctx.mem,
        swap,
        &buffers,
        count,
        &mut ctx.state.env_values,
        &ctx.state.env_steps,
        &xors,
    );
}

fn envmixer_mk(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let xors = [xor_mask(w1, 0x2), xor_mask(w1, 0x1), 0, 0];
    run_envmixer(ctx, w1, w2, false, xors);
}

fn envmixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let swap = (w1 >> 4) & 0x1 != 0;
    // the wet masks are the flag bits shifted down once: -4 and -2
    let xors = [
        xor_mask(w1, 0x2),
        xor_mask(w1, 0x1),
        -(((w1 & 0x8) >> 1) as i16),
        -(((w1 & 0x4) >> 1) as i16),
    ];
    run_envmixer(ctx, w1, w2, swap, xors);
}

fn duplicate(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = (w1 >> 16) as u8;
    let dmemi = w1 as u16;
    let dmemo = (w2 >> 16) as u16;
    buffer::repeat64(ctx.mem, dmemo, dmemi, count);
}

fn interl(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = w1 as u16;
    let dmemi = (w2 >> 16) as u16;
    let dmemo = w2 as u16;
    buffer::copy_every_other_sample(ctx.mem, dmemo, dmemi, count);
}

fn interleave_mk(ctx: &mut AlistContext<'_>, _w1: u32, w2: u32) {
    let left = (w2 >> 16) as u16;
    let right = w2 as u16;
    if ctx.state.count == 0 {
        return;
    }
    buffer::interleave(ctx.mem, ctx.state.out_buf, left, right, ctx.state.count);
}

fn interleave(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = ((w1 >> 12) & 0xFF0) as u16;
    let dmemo = w1 as u16;
    let left = (w2 >> 16) as u16;
    let right = w2 as u16;
    buffer::interleave(ctx.mem, dmemo, left, right, count);
}

fn addmixer(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = ((w1 >> 12) & 0xFF0) as u16;
    let dmemi = (w2 >> 16) as u16;
    let dmemo = w2 as u16;
    mix::add(ctx.mem, dmemo, dmemi, count);
}

fn hilogain(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let gain = (w1 >> 16) as i8;
    let count = (w1 & 0xFFF) as u16;
    let dmem = (w2 >> 16) as u16;
    mix::mult_q44(ctx.mem, dmem, count, gain);
}

fn filter(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let address = address(w2);
    if flags > 1 {
        ctx.state.filter_count = w1 as u16;
        ctx.state.filter_lut_address[0] = address;
    } else {
        let dmem = w1 as u16;
        ctx.state.filter_lut_address[1] = address.wrapping_add(0x10);
        filter::filter(
            ctx.mem,
            dmem,
            ctx.state.filter_count,
            address,
            ctx.state.filter_lut_address,
        );
    }
}

fn segment(_ctx: &mut AlistContext<'_>, _w1: u32, _w2: u32) {}

fn nead_16(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let count = (w1 >> 16) as u8;
    let dmemi = w1 as u16;
    let dmemo = (w2 >> 16) as u16;
    let block_size = w2 as u16;
    buffer::copy_blocks(ctx.mem, dmemo, dmemi, block_size, count);
}

fn polef(ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    let flags = (w1 >> 16) as u8;
    let gain = w1 as u16;
    if ctx.state.count == 0 {
        return;
    }
    let (out_buf, in_buf, count) = (ctx.state.out_buf, ctx.state.in_buf, ctx.state.count);
    filter::polef(
        ctx.mem,
        flags & 0x1 != 0,
        out_buf,
        in_buf,
        count,
        gain,
        &mut ctx.state.table,
        address(w2),
    );
}

#[rustfmt::skip]
static NEAD_MK: [Handler; 32] = [
    spnoop,         adpcm,          clearbuff,      spnoop,
    spnoop,         resample,       spnoop,         segment,
    setbuff,        spnoop,         dmemmove,       loadadpcm,
    mixer,          interleave_mk,  polef,          setloop,
    nead_16,        interl,         envsetup1_mk,   envmixer_mk,
    loadbuff,       savebuff,       envsetup2,      spnoop,
    spnoop,         spnoop,         spnoop,         spnoop,
    spnoop,         spnoop,         spnoop,         spnoop,
];

#[rustfmt::skip]
static NEAD_SF: [Handler; 32] = [
    spnoop,         adpcm,          clearbuff,      spnoop,
    addmixer,       resample,       resample_zoh,   spnoop,
    setbuff,        spnoop,         dmemmove,       loadadpcm,
    mixer,          interleave_mk,  polef,          setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      spnoop,
    hilogain,       unknown,        duplicate,      spnoop,
    spnoop,         spnoop,         spnoop,         spnoop,
];

#[rustfmt::skip]
static NEAD_WRJB: [Handler; 32] = [
    spnoop,         adpcm,          clearbuff,      unknown,
    addmixer,       resample,       resample_zoh,   spnoop,
    setbuff,        spnoop,         dmemmove,       loadadpcm,
    mixer,          interleave,     spnoop,         setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      unknown,
    hilogain,       unknown,        duplicate,      filter,
    spnoop,         spnoop,         spnoop,         spnoop,
];

#[rustfmt::skip]
static NEAD_FZ: [Handler; 32] = [
    unknown,        adpcm,          clearbuff,      spnoop,
    addmixer,       resample,       spnoop,         spnoop,
    setbuff,        spnoop,         dmemmove,       loadadpcm,
    mixer,          interleave,     spnoop,         setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      unknown,
    spnoop,         unknown,        duplicate,      spnoop,
    spnoop,         spnoop,         spnoop,         spnoop,
];

#[rustfmt::skip]
static NEAD_OOT: [Handler; 24] = [
    unknown,        adpcm,          clearbuff,      unknown,
    addmixer,       resample,       resample_zoh,   filter,
    setbuff,        duplicate,      dmemmove,       loadadpcm,
    mixer,          interleave,     hilogain,       setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      unknown,
];

#[rustfmt::skip]
static NEAD_MM: [Handler; 24] = [
    unknown,        adpcm,          clearbuff,      spnoop,
    addmixer,       resample,       resample_zoh,   filter,
    setbuff,        duplicate,      dmemmove,       loadadpcm,
    mixer,          interleave,     hilogain,       setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      unknown,
];

#[rustfmt::skip]
static NEAD_MMB: [Handler; 24] = [
    spnoop,         adpcm,          clearbuff,      spnoop,
    addmixer,       resample,       resample_zoh,   filter,
    setbuff,        duplicate,      dmemmove,       loadadpcm,
    mixer,          interleave,     hilogain,       setloop,
    nead_16,        interl,         envsetup1,      envmixer,
    loadbuff,       savebuff,       envsetup2,      unknown,
];

pub(crate) fn handlers(dialect: Dialect) -> &'static [Handler] {
    match dialect {
        Dialect::NeadMk => &NEAD_MK,
        Dialect::NeadSfj | Dialect::NeadSf => &NEAD_SF,
        Dialect::NeadWrjb => &NEAD_WRJB,
        Dialect::NeadFz => &NEAD_FZ,
        Dialect::NeadMm => &NEAD_MM,
        Dialect::NeadMmb => &NEAD_MMB,
        // ys, 1080, oot, ac
        _ => &NEAD_OOT,
    }
}
