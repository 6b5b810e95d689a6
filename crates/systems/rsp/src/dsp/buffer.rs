//! Buffer management: clear, DMA, moves and interleaving.

use super::align;
use crate::memory::RspMemory;

/// Zero `count` bytes of DMEM.
pub fn clear(mem: &mut RspMemory, dmem: u16, count: u16) {
    for k in 0..count {
        mem.dmem.set_u8(u32::from(dmem.wrapping_add(k)), 0);
    }
}

/// RDRAM -> DMEM with the DMA engine's alignment rules applied.
pub fn load(mem: &mut RspMemory, dmem: u16, address: u32, count: u16) {
    let dmem = dmem & !3;
    let address = address & !7;
    let count = align(count, 8);
    mem.dma_rdram_to_dmem(dmem, address, count as usize);
}

/// DMEM -> RDRAM with the DMA engine's alignment rules applied.
pub fn save(mem: &mut RspMemory, dmem: u16, address: u32, count: u16) {
    let dmem = dmem & !3;
    let address = address & !7;
    let count = align(count, 8);
    mem.dma_dmem_to_rdram(dmem, address, count as usize);
}

/// Forward byte-at-a-time copy inside DMEM. Overlap behaves like the RSP loop.
pub fn dmem_move(mem: &mut RspMemory, dmemo: u16, dmemi: u16, count: u16) {
    for k in 0..count {
        let b = mem.dmem.u8(u32::from(dmemi.wrapping_add(k)));
        mem.dmem.set_u8(u32::from(dmemo.wrapping_add(k)), b);
    }
}

/// Copy `count` samples, taking every other sample from the source.
pub fn copy_every_other_sample(mem: &mut RspMemory, dmemo: u16, dmemi: u16, count: u16) {
    let (mut dmemo, mut dmemi) = (dmemo, dmemi);
    for _ in 0..count {
        let s = mem.dmem.u16(u32::from(dmemi));
        mem.dmem.set_u16(u32::from(dmemo), s);
        dmemo = dmemo.wrapping_add(2);
        dmemi = dmemi.wrapping_add(4);
    }
}

/// Replicate the 128 bytes at `dmemi` `count` times starting at `dmemo`.
pub fn repeat64(mem: &mut RspMemory, dmemo: u16, dmemi: u16, count: u8) {
    let mut block = [0u8; 128];
    mem.dmem.load_u8(&mut block, u32::from(dmemi));

    let mut dmemo = dmemo;
    for _ in 0..count {
        mem.dmem.store_u8(&block, u32::from(dmemo));
        dmemo = dmemo.wrapping_add(128);
    }
}

/// Copy `count` blocks of `block_size` bytes in 32-byte chunks.
///
/// At least one block and one chunk are always copied.
pub fn copy_blocks(mem: &mut RspMemory, dmemo: u16, dmemi: u16, block_size: u16, count: u8) {
    let (mut dmemo, mut dmemi) = (dmemo, dmemi);
    let mut chunk = [0u8; 0x20];
    let mut blocks_left = i32::from(count);
    loop {
        let mut bytes_left = i32::from(block_size);
        loop {
            mem.dmem.load_u8(&mut chunk, u32::from(dmemi));
            mem.dmem.store_u8(&chunk, u32::from(dmemo));
            bytes_left -= 0x20;
            dmemi = dmemi.wrapping_add(0x20);
            dmemo = dmemo.wrapping_add(0x20);
            if bytes_left <= 0 {
                break;
            }
        }
        blocks_left -= 1;
        if blocks_left <= 0 {
            break;
        }
    }
}

/// Interleave two mono buffers into `L R L R ...`; `count` is bytes per channel.
pub fn interleave(mem: &mut RspMemory, dmemo: u16, left: u16, right: u16, count: u16) {
    let (mut dst, mut l, mut r) = (dmemo, left, right);
    for _ in 0..(count >> 2) {
        let l1 = mem.dmem.u16(u32::from(l));
        let l2 = mem.dmem.u16(u32::from(l.wrapping_add(2)));
        let r1 = mem.dmem.u16(u32::from(r));
        let r2 = mem.dmem.u16(u32::from(r.wrapping_add(2)));
        mem.dmem.store_u16(&[l1, r1, l2, r2], u32::from(dst));
        l = l.wrapping_add(4);
        r = r.wrapping_add(4);
        dst = dst.wrapping_add(8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> RspMemory {
        RspMemory::new(0x10000)
    }

    #[test]
    fn test_clear_zero_count_is_noop() {
        let mut m = mem();
        m.dmem.fill(0xAA);
        clear(&mut m, 0x100, 0);
        assert!(m.dmem.as_slice().iter().all(|&b| b == 0xAA));
        clear(&mut m, 0x100, 3);
        assert_eq!(m.dmem.u32(0x100), 0x0000_00AA);
    }

    #[test]
    fn test_load_enforces_alignment() {
        let mut m = mem();
        for k in 0..32u32 {
            m.rdram.set_u8(0x200 + k, k as u8 + 1);
        }
        // dmem 0x103 -> 0x100, address 0x205 -> 0x200, count 5 -> 8
        load(&mut m, 0x103, 0x205, 5);
        assert_eq!(m.dmem.u32(0x100), 0x0102_0304);
        assert_eq!(m.dmem.u32(0x104), 0x0506_0708);
        assert_eq!(m.dmem.u8(0x108), 0);
    }

    #[test]
    fn test_save_enforces_alignment() {
        let mut m = mem();
        m.dmem.store_u8(&[9; 16], 0x40);
        save(&mut m, 0x42, 0x30F, 1);
        assert_eq!(m.rdram_bytes(0x308, 8), vec![9; 8]);
        assert_eq!(m.rdram.u8(0x310), 0);
    }

    #[test]
    fn test_dmem_move_forward_overlap() {
        let mut m = mem();
        m.dmem.store_u8(&[1, 2, 3, 4], 0x10);
        dmem_move(&mut m, 0x11, 0x10, 3);
        // byte-at-a-time forward copy smears the first byte
        assert_eq!(m.dmem.u32(0x10), 0x0101_0101);
    }

    #[test]
    fn test_copy_every_other_sample() {
        let mut m = mem();
        m.dmem.store_i16(&[1, 2, 3, 4, 5, 6], 0x20);
        copy_every_other_sample(&mut m, 0x80, 0x20, 3);
        let mut out = [0i16; 3];
        m.dmem.load_i16(&mut out, 0x80);
        assert_eq!(out, [1, 3, 5]);
    }

    #[test]
    fn test_repeat64() {
        let mut m = mem();
        let pattern: Vec<u8> = (0..128).map(|k| k as u8).collect();
        m.dmem.store_u8(&pattern, 0x000);
        repeat64(&mut m, 0x200, 0x000, 3);
        for k in 0..3u32 {
            let mut block = [0u8; 128];
            m.dmem.load_u8(&mut block, 0x200 + 128 * k);
            assert_eq!(&block[..], &pattern[..]);
        }
        assert_eq!(m.dmem.u8(0x200 + 384), 0);
    }

    #[test]
    fn test_copy_blocks_copies_at_least_one_chunk() {
        let mut m = mem();
        m.dmem.store_u8(&[7; 0x40], 0x100);
        copy_blocks(&mut m, 0x300, 0x100, 0, 0);
        assert_eq!(m.dmem.u8(0x300 + 0x1F), 7);
        assert_eq!(m.dmem.u8(0x300 + 0x20), 0);

        // two blocks of 0x28 bytes -> two chunks each
        copy_blocks(&mut m, 0x500, 0x100, 0x28, 2);
        assert_eq!(m.dmem.u8(0x500 + 0x3F), 7);
        assert_eq!(m.dmem.u8(0x500 + 0x40), 0); // source ran past the pattern
    }

    #[test]
    fn test_interleave() {
        let mut m = mem();
        m.dmem.store_i16(&[1, 2, 3, 4], 0x100);
        m.dmem.store_i16(&[-1, -2, -3, -4], 0x200);
        interleave(&mut m, 0x300, 0x100, 0x200, 8);
        let mut out = [0i16; 8];
        m.dmem.load_i16(&mut out, 0x300);
        assert_eq!(out, [1, -1, 2, -2, 3, -3, 4, -4]);
    }
}
