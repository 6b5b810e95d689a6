use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rsp_hle::dsp::adpcm::{self, AdpcmHistory, CODEBOOK_LEN};
use rsp_hle::dsp::envmix::{self, EnvmixBuffers, EnvmixParams};
use rsp_hle::dsp::resample;
use rsp_hle::RspMemory;

const IN: u16 = 0x100;
const OUT: u16 = 0x600;
const STATE: u32 = 0x8000;

/// DMEM filled with a repeating pseudo-random pattern
fn bench_memory() -> RspMemory {
    let mut mem = RspMemory::new(0x10000);
    let mut x: u32 = 0x1234_5678;
    for b in mem.dmem.as_mut_slice()[..0xC00].iter_mut() {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12345);
        *b = (x >> 16) as u8;
    }
    mem
}

fn bench_adpcm(c: &mut Criterion) {
    let mut group = c.benchmark_group("adpcm_decode");
    let mut codebook = [0i16; CODEBOOK_LEN];
    for (k, c) in codebook.iter_mut().enumerate() {
        *c = ((k as i32 * 97) % 4096 - 2048) as i16;
    }

    for frames in [4u16, 16, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(frames), frames, |b, &frames| {
            let mut mem = bench_memory();
            b.iter(|| {
                adpcm::decode(
                    &mut mem,
                    AdpcmHistory::Init,
                    false,
                    OUT,
                    IN,
                    frames * 32,
                    &codebook,
                    0,
                    STATE,
                );
                black_box(mem.dmem.u16(u32::from(OUT)));
            });
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    group.bench_function("interpolated", |b| {
        let mut mem = bench_memory();
        b.iter(|| {
            resample::resample(&mut mem, true, false, OUT, IN + 8, 0x170, 0x1_2000, STATE);
            black_box(mem.dmem.u16(u32::from(OUT)));
        });
    });

    group.bench_function("zero_order_hold", |b| {
        let mut mem = bench_memory();
        b.iter(|| {
            resample::resample_zoh(&mut mem, OUT, IN, 0x170, 0x1_2000, 0);
            black_box(mem.dmem.u16(u32::from(OUT)));
        });
    });

    group.finish();
}

fn bench_envmix(c: &mut Criterion) {
    let mut group = c.benchmark_group("envmix");
    let buffers = EnvmixBuffers {
        dry_left: 0x800,
        dry_right: 0x980,
        wet_left: 0xB00,
        wet_right: 0xC80,
        input: IN,
    };
    let params = EnvmixParams {
        dry: 0x7000,
        wet: 0x2000,
        vol: [0x4000, 0x4000],
        target: [0x7FFF, 0x1000],
        rate: [0x0001_2000, 0x0000_E000],
    };

    group.bench_function("exponential", |b| {
        let mut mem = bench_memory();
        b.iter(|| {
            envmix::envmix_exp(&mut mem, true, true, &buffers, 0x170, &params, STATE);
            black_box(mem.dmem.u16(0x800));
        });
    });

    group.bench_function("linear", |b| {
        let mut mem = bench_memory();
        b.iter(|| {
            envmix::envmix_lin(&mut mem, true, &buffers, 0x170, &params, STATE);
            black_box(mem.dmem.u16(0x800));
        });
    });

    group.bench_function("nead", |b| {
        let mut mem = bench_memory();
        b.iter(|| {
            let mut values = [0x6000, 0x5000, 0x2000];
            envmix::envmix_nead(
                &mut mem,
                false,
                &buffers,
                0xB8,
                &mut values,
                &[0x10, 0x10, 0],
                &[0; 4],
            );
            black_box(values);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_adpcm, bench_resample, bench_envmix);
criterion_main!(benches);
