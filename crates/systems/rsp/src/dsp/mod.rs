//! Fixed-point DSP primitives shared by every audio command set.
//!
//! All routines are stateless: persistent codec state lives in RDRAM at
//! operand-supplied addresses and is loaded/saved explicitly. Samples are
//! big-endian `i16` in DMEM, addressed by byte offsets that wrap inside the
//! 4KB scratchpad.

pub mod adpcm;
pub mod buffer;
pub mod envmix;
pub mod filter;
pub mod mix;
pub mod resample;

pub use hle_core::types::clamp_s16;

/// Round `x` up to a multiple of `m` (a power of two).
#[inline]
pub fn align(x: u16, m: u16) -> u16 {
    x.wrapping_add(m - 1) & !(m - 1)
}

/// RSP `VMULF`: signed fractional multiply with rounding, truncated to 16 bits.
#[inline]
pub fn vmulf(x: i16, y: i16) -> i16 {
    ((x as i32 * y as i32 + 0x4000) >> 15) as i16
}

/// Reversed dot product: `Σ_{k<n} x[k] * y[n-1-k]` with `n = x.len()`.
#[inline]
pub fn rdot(x: &[i16], y: &[i16]) -> i32 {
    x.iter()
        .zip(y[..x.len()].iter().rev())
        .fold(0i32, |accu, (&a, &b)| {
            accu.wrapping_add(a as i32 * b as i32)
        })
}

/// Saturating 16-bit add.
#[inline]
pub fn sadd(a: i16, b: i16) -> i16 {
    clamp_s16(a as i32 + b as i32)
}

/// Byte address of sample index `pos` in DMEM.
#[inline]
pub(crate) fn sample_addr(pos: u16) -> u32 {
    u32::from(pos) << 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(0, 16), 0);
        assert_eq!(align(1, 16), 16);
        assert_eq!(align(0x170, 32), 0x180);
        assert_eq!(align(24, 8), 24);
    }

    #[test]
    fn test_vmulf_rounds() {
        assert_eq!(vmulf(0x4000, 0x4000), 0x2000);
        assert_eq!(vmulf(1, 0x4000), 1); // 0x4000 + 0x4000 >> 15
        assert_eq!(vmulf(-1, 0x3FFF), 0);
        assert_eq!(vmulf(i16::MIN, i16::MIN), i16::MIN); // 0x8000 truncates
    }

    #[test]
    fn test_rdot() {
        let x = [1, 2, 3];
        let y = [10, 20, 30, 40];
        // 1*30 + 2*20 + 3*10
        assert_eq!(rdot(&x, &y), 100);
        assert_eq!(rdot(&[], &y), 0);
    }

    #[test]
    fn test_sadd_saturates() {
        assert_eq!(sadd(30000, 10000), i16::MAX);
        assert_eq!(sadd(-30000, -10000), i16::MIN);
        assert_eq!(sadd(5, -7), -2);
    }
}
