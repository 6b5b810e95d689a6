#![allow(dead_code)]

use rsp_hle::dispatch::UcodeFamily;
use rsp_hle::{Collaborator, Host, RspMemory, TaskDescriptor};

pub const RDRAM_SIZE: usize = 0x10000;
pub const UCODE: u32 = 0x0800;
pub const UCODE_DATA: u32 = 0x1000;
pub const DATA_PTR: u32 = 0x2000;

#[derive(Debug, Default)]
pub struct RecordingHost {
    pub invoked: Vec<Collaborator>,
    pub mp3: Vec<(u32, u32)>,
}

impl Host for RecordingHost {
    fn invoke(&mut self, collaborator: Collaborator, _mem: &mut RspMemory) {
        self.invoked.push(collaborator);
    }

    fn mp3(&mut self, index: u32, address: u32, _mem: &mut RspMemory) {
        self.mp3.push((index, address));
    }
}

/// Write an audio task descriptor pointing at `commands` in RDRAM.
pub fn audio_task(mem: &mut RspMemory, commands: &[(u32, u32)]) {
    for (k, &(w1, w2)) in commands.iter().enumerate() {
        let address = DATA_PTR + 8 * k as u32;
        mem.rdram.set_u32(address, w1);
        mem.rdram.set_u32(address + 4, w2);
    }
    TaskDescriptor {
        task_type: 2,
        ucode_boot: 0x0400,
        ucode_boot_size: 0x100,
        ucode: UCODE,
        ucode_size: 0xF80,
        ucode_data: UCODE_DATA,
        ucode_data_size: 0x800,
        data_ptr: DATA_PTR,
        data_size: 8 * commands.len() as u32,
        ..Default::default()
    }
    .write(&mut mem.dmem);
}

/// Write a ucode data header that identifies as `key` in `family`.
pub fn ucode_header(mem: &mut RspMemory, family: UcodeFamily, key: u32) {
    for offset in (0..0x40).step_by(4) {
        mem.rdram.set_u32(UCODE_DATA + offset, 0);
    }
    match family {
        UcodeFamily::Abi1 => {
            mem.rdram.set_u32(UCODE_DATA, 1);
            mem.rdram.set_u32(UCODE_DATA + 0x30, 0xF000_0F00);
            mem.rdram.set_u32(UCODE_DATA + 0x28, key);
        }
        UcodeFamily::Abi2 => {
            mem.rdram.set_u32(UCODE_DATA, 1);
            mem.rdram.set_u32(UCODE_DATA + 0x10, key);
        }
        UcodeFamily::Abi3 => {
            mem.rdram.set_u32(UCODE_DATA, 2);
            mem.rdram.set_u32(UCODE_DATA + 0x10, key);
        }
    }
}

/// A fresh scratch directory under the system temp dir.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn read_i16(mem: &RspMemory, address: u32, n: usize) -> Vec<i16> {
    let mut out = vec![0i16; n];
    mem.rdram.load_i16(&mut out, address);
    out
}
