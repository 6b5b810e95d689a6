//! Diagnostic dumps for tasks nobody recognized.
//!
//! Files are named after the ucode checksum and are only ever created: an
//! existing file is left as it is, so a game that keeps submitting the same
//! unknown task produces one set of dumps.

use crate::memory::RspMemory;
use crate::task::TaskDescriptor;
use hle_core::logging::{log, LogCategory, LogLevel};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cap on the ucode image written for unknown tasks (the IMEM text area)
pub const UCODE_DUMP_SIZE: usize = 0xF80;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Couldn't open {path} for writing: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Writing error on {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What happened to one dump file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpStatus {
    Created,
    AlreadyExists,
}

/// Writes dump files into one directory.
#[derive(Debug, Clone)]
pub struct Dumper {
    dir: PathBuf,
    enabled: bool,
}

impl Dumper {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create `name` with `bytes` unless it already exists.
    pub fn write_once(&self, name: &str, bytes: &[u8]) -> Result<DumpStatus, DumpError> {
        let path = self.dir.join(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(DumpStatus::AlreadyExists)
            }
            Err(source) => return Err(DumpError::Open { path, source }),
        };
        file.write_all(bytes)
            .map_err(|source| DumpError::Write { path, source })?;
        Ok(DumpStatus::Created)
    }

    /// Like [`Dumper::write_once`], but failures are logged instead of returned.
    fn dump(&self, name: &str, bytes: &[u8]) {
        match self.write_once(name, bytes) {
            Ok(DumpStatus::Created) => {
                log(LogCategory::Dump, LogLevel::Info, || {
                    format!("Wrote {}", self.dir.join(name).display())
                });
            }
            Ok(DumpStatus::AlreadyExists) => {}
            Err(e) => {
                log(LogCategory::Dump, LogLevel::Error, || e.to_string());
            }
        }
    }

    /// Dump the descriptor and every RDRAM segment it points at.
    /// Segment sizes are capped at the size of RDRAM.
    pub fn dump_unknown_task(&self, mem: &RspMemory, task: &TaskDescriptor, sum: u32) {
        if !self.enabled {
            return;
        }

        self.dump(&format!("task_{:x}.log", sum), task.to_log().as_bytes());

        self.dump(
            &format!("ucode_boot_{:x}.bin", sum),
            &rdram_segment(mem, task.ucode_boot, task.ucode_boot_size),
        );

        if task.ucode != 0 {
            self.dump(
                &format!("ucode_{:x}.bin", sum),
                &mem.rdram_bytes(task.ucode, UCODE_DUMP_SIZE),
            );
        }

        if task.ucode_data != 0 {
            self.dump(
                &format!("ucode_data_{:x}.bin", sum),
                &rdram_segment(mem, task.ucode_data, task.ucode_data_size),
            );
        }

        if task.data_ptr != 0 {
            self.dump(
                &format!("data_{:x}.bin", sum),
                &rdram_segment(mem, task.data_ptr, task.data_size),
            );
        }
    }

    /// Dump IMEM and DMEM of an RSP run that was not an OSTask.
    pub fn dump_unknown_non_task(&self, mem: &RspMemory, sum: u32) {
        if !self.enabled {
            return;
        }
        self.dump(&format!("imem_{:x}.bin", sum), mem.imem.as_slice());
        self.dump(&format!("dmem_{:x}.bin", sum), mem.dmem.as_slice());
    }
}

/// `size` bytes at `address`, at most all of RDRAM
fn rdram_segment(mem: &RspMemory, address: u32, size: u32) -> Vec<u8> {
    let count = (size as usize).min(mem.rdram.len());
    mem.rdram_bytes(address, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_write_once_never_overwrites() {
        let dir = temp_dir("rsp_hle_test_dump_once");
        let dumper = Dumper::new(&dir, true);

        assert_eq!(dumper.write_once("a.bin", b"first").unwrap(), DumpStatus::Created);
        assert_eq!(
            dumper.write_once("a.bin", b"second").unwrap(),
            DumpStatus::AlreadyExists
        );
        assert_eq!(fs::read(dir.join("a.bin")).unwrap(), b"first");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_into_missing_dir_is_an_error() {
        let dir = std::env::temp_dir().join("rsp_hle_test_dump_missing/nested");
        let _ = fs::remove_dir_all(std::env::temp_dir().join("rsp_hle_test_dump_missing"));
        let dumper = Dumper::new(&dir, true);
        assert!(matches!(
            dumper.write_once("x.bin", b""),
            Err(DumpError::Open { .. })
        ));
    }

    #[test]
    fn test_unknown_task_skips_null_segments() {
        let dir = temp_dir("rsp_hle_test_dump_task");
        let dumper = Dumper::new(&dir, true);
        let mut mem = RspMemory::new(0x10000);
        mem.rdram.store_u8(&[0xAB; 16], 0x100);

        let task = TaskDescriptor {
            ucode_boot: 0x100,
            ucode_boot_size: 16,
            ucode_data: 0x100,
            ucode_data_size: 8,
            ..Default::default()
        };
        dumper.dump_unknown_task(&mem, &task, 0x1234);

        assert_eq!(fs::read(dir.join("ucode_boot_1234.bin")).unwrap(), vec![0xAB; 16]);
        assert_eq!(fs::read(dir.join("ucode_data_1234.bin")).unwrap(), vec![0xAB; 8]);
        assert!(dir.join("task_1234.log").exists());
        assert!(!dir.join("ucode_1234.bin").exists());
        assert!(!dir.join("data_1234.bin").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_oversized_segments_are_capped_at_rdram() {
        let dir = temp_dir("rsp_hle_test_dump_oversized");
        let dumper = Dumper::new(&dir, true);
        let mem = RspMemory::new(0x10000);

        let task = TaskDescriptor {
            ucode_boot_size: 0xFFFF_FFFF,
            data_ptr: 0x2000,
            data_size: 0x1000_0000,
            ..Default::default()
        };
        dumper.dump_unknown_task(&mem, &task, 0x10);

        assert_eq!(fs::read(dir.join("data_10.bin")).unwrap().len(), 0x10000);
        assert_eq!(fs::read(dir.join("ucode_boot_10.bin")).unwrap().len(), 0x10000);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_disabled_dumper_writes_nothing() {
        let dir = temp_dir("rsp_hle_test_dump_disabled");
        let dumper = Dumper::new(&dir, false);
        dumper.dump_unknown_non_task(&RspMemory::new(0x1000), 0x9E3);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
        fs::remove_dir_all(&dir).unwrap();
    }
}
