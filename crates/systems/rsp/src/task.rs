//! The OSTask descriptor the CPU leaves at the top of DMEM.

use crate::memory::Region;
use serde::Serialize;

/// DMEM offset of the descriptor
pub const TASK_BASE: u32 = 0xFC0;

pub const TASK_TYPE: u32 = 0xFC0;
pub const TASK_FLAGS: u32 = 0xFC4;
pub const TASK_UCODE_BOOT: u32 = 0xFC8;
pub const TASK_UCODE_BOOT_SIZE: u32 = 0xFCC;
pub const TASK_UCODE: u32 = 0xFD0;
pub const TASK_UCODE_SIZE: u32 = 0xFD4;
pub const TASK_UCODE_DATA: u32 = 0xFD8;
pub const TASK_UCODE_DATA_SIZE: u32 = 0xFDC;
pub const TASK_DRAM_STACK: u32 = 0xFE0;
pub const TASK_DRAM_STACK_SIZE: u32 = 0xFE4;
pub const TASK_OUTPUT_BUFF: u32 = 0xFE8;
pub const TASK_OUTPUT_BUFF_SIZE: u32 = 0xFEC;
pub const TASK_DATA_PTR: u32 = 0xFF0;
pub const TASK_DATA_SIZE: u32 = 0xFF4;
pub const TASK_YIELD_DATA_PTR: u32 = 0xFF8;
pub const TASK_YIELD_DATA_SIZE: u32 = 0xFFC;

/// Task categories found in `TASK_TYPE`
pub const M_GFXTASK: u32 = 1;
pub const M_AUDTASK: u32 = 2;
pub const M_SHOWCFB: u32 = 7;

/// Largest boot ucode an osSpTask* launch can carry
const MAX_UCODE_BOOT_SIZE: u32 = 0x1000;

/// A snapshot of the task descriptor, read once per dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub task_type: u32,
    pub flags: u32,
    pub ucode_boot: u32,
    pub ucode_boot_size: u32,
    pub ucode: u32,
    pub ucode_size: u32,
    pub ucode_data: u32,
    pub ucode_data_size: u32,
    pub dram_stack: u32,
    pub dram_stack_size: u32,
    pub output_buff: u32,
    pub output_buff_size: u32,
    pub data_ptr: u32,
    pub data_size: u32,
    pub yield_data_ptr: u32,
    pub yield_data_size: u32,
}

impl TaskDescriptor {
    pub fn read(dmem: &Region) -> Self {
        let mut words = [0u32; 16];
        dmem.load_u32(&mut words, TASK_BASE);
        let [
            task_type,
            flags,
            ucode_boot,
            ucode_boot_size,
            ucode,
            ucode_size,
            ucode_data,
            ucode_data_size,
            dram_stack,
            dram_stack_size,
            output_buff,
            output_buff_size,
            data_ptr,
            data_size,
            yield_data_ptr,
            yield_data_size,
        ] = words;
        Self {
            task_type,
            flags,
            ucode_boot,
            ucode_boot_size,
            ucode,
            ucode_size,
            ucode_data,
            ucode_data_size,
            dram_stack,
            dram_stack_size,
            output_buff,
            output_buff_size,
            data_ptr,
            data_size,
            yield_data_ptr,
            yield_data_size,
        }
    }

    /// Write the descriptor back to DMEM (test fixtures and the CLI use this).
    pub fn write(&self, dmem: &mut Region) {
        dmem.store_u32(
            &[
                self.task_type,
                self.flags,
                self.ucode_boot,
                self.ucode_boot_size,
                self.ucode,
                self.ucode_size,
                self.ucode_data,
                self.ucode_data_size,
                self.dram_stack,
                self.dram_stack_size,
                self.output_buff,
                self.output_buff_size,
                self.data_ptr,
                self.data_size,
                self.yield_data_ptr,
                self.yield_data_size,
            ],
            TASK_BASE,
        );
    }

    /// Whether the RSP was started through osSpTask*, i.e. DMEM 0xFC0.. holds
    /// a descriptor at all.
    ///
    /// Games write anything into `ucode_size`, but boot ucodes are never
    /// larger than IMEM.
    pub fn is_task(&self) -> bool {
        self.ucode_boot_size <= MAX_UCODE_BOOT_SIZE
    }

    /// Human-readable dump, one field per line.
    pub fn to_log(&self) -> String {
        format!(
            "type = {}\n\
             flags = {}\n\
             ucode_boot  = {:#08x} size  = {:#x}\n\
             ucode       = {:#08x} size  = {:#x}\n\
             ucode_data  = {:#08x} size  = {:#x}\n\
             dram_stack  = {:#08x} size  = {:#x}\n\
             output_buff = {:#08x} *size = {:#x}\n\
             data        = {:#08x} size  = {:#x}\n\
             yield_data  = {:#08x} size  = {:#x}\n",
            self.task_type,
            self.flags,
            self.ucode_boot,
            self.ucode_boot_size,
            self.ucode,
            self.ucode_size,
            self.ucode_data,
            self.ucode_data_size,
            self.dram_stack,
            self.dram_stack_size,
            self.output_buff,
            self.output_buff_size,
            self.data_ptr,
            self.data_size,
            self.yield_data_ptr,
            self.yield_data_size,
        )
    }
}
