//! RSP-visible memories: DMEM, IMEM and RDRAM.
//!
//! Every region is a power of two in size and every access masks its
//! address with `size - 1`, byte by byte. A 32-bit access at `size - 1`
//! therefore touches bytes `size - 1, 0, 1, 2` of the *same* region, the
//! way the RSP's address lines wrap. No offset is ever rejected.
//!
//! Storage is big-endian, as on the console: a 16-bit sample at offset `n`
//! is `bytes[n] << 8 | bytes[n + 1]`.

use crate::HleError;
use hle_core::logging::{log, LogCategory, LogLevel};

/// DMEM (scratchpad) size
pub const DMEM_SIZE: usize = 0x1000;
/// IMEM (instruction memory) size
pub const IMEM_SIZE: usize = 0x1000;

/// A wrapping, big-endian byte region.
#[derive(Clone)]
pub struct Region {
    bytes: Vec<u8>,
    mask: u32,
}

impl Region {
    /// Create a zeroed region. Sizes that are not a power of two are rounded up.
    pub fn new(size: usize) -> Self {
        let size = size.max(4).next_power_of_two();
        Self {
            bytes: vec![0; size],
            mask: (size - 1) as u32,
        }
    }

    /// Create a region initialized from `data`; the size is rounded up like [`Region::new`].
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut region = Self::new(data.len());
        region.bytes[..data.len()].copy_from_slice(data);
        region
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn fill(&mut self, value: u8) {
        self.bytes.fill(value);
    }

    #[inline]
    fn index(&self, addr: u32) -> usize {
        (addr & self.mask) as usize
    }

    #[inline]
    pub fn u8(&self, addr: u32) -> u8 {
        self.bytes[self.index(addr)]
    }

    #[inline]
    pub fn set_u8(&mut self, addr: u32, value: u8) {
        let i = self.index(addr);
        self.bytes[i] = value;
    }

    #[inline]
    pub fn u16(&self, addr: u32) -> u16 {
        u16::from_be_bytes([self.u8(addr), self.u8(addr.wrapping_add(1))])
    }

    #[inline]
    pub fn set_u16(&mut self, addr: u32, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.set_u8(addr, hi);
        self.set_u8(addr.wrapping_add(1), lo);
    }

    #[inline]
    pub fn i16(&self, addr: u32) -> i16 {
        self.u16(addr) as i16
    }

    #[inline]
    pub fn set_i16(&mut self, addr: u32, value: i16) {
        self.set_u16(addr, value as u16);
    }

    #[inline]
    pub fn u32(&self, addr: u32) -> u32 {
        let i = self.index(addr);
        if let Some(word) = self.bytes.get(i..i + 4) {
            return u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        }
        u32::from_be_bytes([
            self.u8(addr),
            self.u8(addr.wrapping_add(1)),
            self.u8(addr.wrapping_add(2)),
            self.u8(addr.wrapping_add(3)),
        ])
    }

    #[inline]
    pub fn set_u32(&mut self, addr: u32, value: u32) {
        let i = self.index(addr);
        let bytes = value.to_be_bytes();
        if let Some(word) = self.bytes.get_mut(i..i + 4) {
            word.copy_from_slice(&bytes);
            return;
        }
        for (k, b) in bytes.into_iter().enumerate() {
            self.set_u8(addr.wrapping_add(k as u32), b);
        }
    }

    pub fn load_u8(&self, dst: &mut [u8], addr: u32) {
        for (k, d) in dst.iter_mut().enumerate() {
            *d = self.u8(addr.wrapping_add(k as u32));
        }
    }

    pub fn load_u16(&self, dst: &mut [u16], addr: u32) {
        for (k, d) in dst.iter_mut().enumerate() {
            *d = self.u16(addr.wrapping_add(2 * k as u32));
        }
    }

    pub fn load_i16(&self, dst: &mut [i16], addr: u32) {
        for (k, d) in dst.iter_mut().enumerate() {
            *d = self.i16(addr.wrapping_add(2 * k as u32));
        }
    }

    /// Word copy; contiguous runs go through a single slice copy.
    pub fn load_u32(&self, dst: &mut [u32], addr: u32) {
        let start = self.index(addr);
        let end = start + dst.len() * 4;
        if let Some(run) = self.bytes.get(start..end) {
            for (d, chunk) in dst.iter_mut().zip(run.chunks_exact(4)) {
                *d = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            return;
        }
        for (k, d) in dst.iter_mut().enumerate() {
            *d = self.u32(addr.wrapping_add(4 * k as u32));
        }
    }

    pub fn store_u8(&mut self, src: &[u8], addr: u32) {
        for (k, &s) in src.iter().enumerate() {
            self.set_u8(addr.wrapping_add(k as u32), s);
        }
    }

    pub fn store_u16(&mut self, src: &[u16], addr: u32) {
        for (k, &s) in src.iter().enumerate() {
            self.set_u16(addr.wrapping_add(2 * k as u32), s);
        }
    }

    pub fn store_i16(&mut self, src: &[i16], addr: u32) {
        for (k, &s) in src.iter().enumerate() {
            self.set_i16(addr.wrapping_add(2 * k as u32), s);
        }
    }

    pub fn store_u32(&mut self, src: &[u32], addr: u32) {
        let start = self.index(addr);
        let end = start + src.len() * 4;
        if let Some(run) = self.bytes.get_mut(start..end) {
            for (chunk, s) in run.chunks_exact_mut(4).zip(src) {
                chunk.copy_from_slice(&s.to_be_bytes());
            }
            return;
        }
        for (k, &s) in src.iter().enumerate() {
            self.set_u32(addr.wrapping_add(4 * k as u32), s);
        }
    }
}

/// Everything the HLE reads or writes: the two RSP memories and RDRAM.
///
/// Owned by the host; the HLE borrows it mutably for one dispatch.
#[derive(Clone)]
pub struct RspMemory {
    /// 4KB DMEM (scratchpad, task descriptor at 0xFC0)
    pub dmem: Region,
    /// 4KB IMEM (ucode)
    pub imem: Region,
    /// Main memory
    pub rdram: Region,
}

impl RspMemory {
    pub fn new(rdram_size: usize) -> Self {
        Self {
            dmem: Region::new(DMEM_SIZE),
            imem: Region::new(IMEM_SIZE),
            rdram: Region::new(rdram_size),
        }
    }

    /// Build memory from raw dumps. DMEM and IMEM must be exactly 4 KiB and
    /// RDRAM a power of two.
    pub fn from_snapshots(dmem: &[u8], imem: &[u8], rdram: &[u8]) -> Result<Self, HleError> {
        if dmem.len() != DMEM_SIZE {
            return Err(HleError::DmemSize(dmem.len()));
        }
        if imem.len() != IMEM_SIZE {
            return Err(HleError::ImemSize(imem.len()));
        }
        if !rdram.len().is_power_of_two() {
            return Err(HleError::RdramSize(rdram.len()));
        }
        Ok(Self {
            dmem: Region::from_bytes(dmem),
            imem: Region::from_bytes(imem),
            rdram: Region::from_bytes(rdram),
        })
    }

    /// Copy `count` bytes from RDRAM into DMEM.
    pub fn dma_rdram_to_dmem(&mut self, dmem: u16, address: u32, count: usize) {
        log(LogCategory::Memory, LogLevel::Trace, || {
            format!(
                "DMA RDRAM 0x{:06X} -> DMEM 0x{:03X} ({} bytes)",
                address, dmem, count
            )
        });
        for k in 0..count as u32 {
            let b = self.rdram.u8(address.wrapping_add(k));
            self.dmem.set_u8(u32::from(dmem).wrapping_add(k), b);
        }
    }

    /// Copy `count` bytes from DMEM into RDRAM.
    pub fn dma_dmem_to_rdram(&mut self, dmem: u16, address: u32, count: usize) {
        log(LogCategory::Memory, LogLevel::Trace, || {
            format!(
                "DMA DMEM 0x{:03X} -> RDRAM 0x{:06X} ({} bytes)",
                dmem, address, count
            )
        });
        for k in 0..count as u32 {
            let b = self.dmem.u8(u32::from(dmem).wrapping_add(k));
            self.rdram.set_u8(address.wrapping_add(k), b);
        }
    }

    /// Copy an RDRAM range out, wrapping like every other access.
    pub fn rdram_bytes(&self, address: u32, count: usize) -> Vec<u8> {
        let mut out = vec![0; count];
        self.rdram.load_u8(&mut out, address);
        out
    }
}

impl Default for RspMemory {
    fn default() -> Self {
        Self::new(hle_core::config::DEFAULT_RDRAM_SIZE)
    }
}
