//! Ucode identification.
//!
//! Two fingerprints are used. Audio tasks are first recognized from a few
//! header words of their ucode data segment ([`Fingerprints::identify_audio`]).
//! Everything else falls back to a byte sum over the start of the ucode
//! image ([`Fingerprints::identify_checksum`]). Only exact table hits route
//! somewhere; any other value is reported as unknown.

use crate::alist::Dialect;
use crate::host::Collaborator;
use crate::memory::RspMemory;
use crate::task::TaskDescriptor;
use hle_core::config::{parse_checksum_key, HleConfig};
use hle_core::logging::{log, LogCategory, LogLevel};
use std::collections::HashMap;
use std::fmt;

/// Bytes of the ucode image covered by the checksum, at most
pub const UCODE_SUM_LIMIT: u32 = 0xF80;
/// Bytes of IMEM covered by the non-task checksum
pub const IMEM_SUM_SIZE: usize = 0x800;

/// Where a recognized ucode goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Interpret the command list with this dialect
    Audio(Dialect),
    /// Hand the task to the host
    Forward(Collaborator),
    /// Known ucode with nothing to emulate
    Nothing,
}

/// Audio ucode families, told apart by the ucode data header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UcodeFamily {
    /// Standard audio ABI
    Abi1,
    /// nead and MusyX v2
    Abi2,
    /// naudio and MusyX v1
    Abi3,
}

impl fmt::Display for UcodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UcodeFamily::Abi1 => f.write_str("ABI1"),
            UcodeFamily::Abi2 => f.write_str("ABI2"),
            UcodeFamily::Abi3 => f.write_str("ABI3"),
        }
    }
}

const ABI1_SIGNATURES: &[(u32, Route)] = &[
    (0x1E24_138C, Route::Audio(Dialect::Audio)),
    (0x1DC8_138C, Route::Audio(Dialect::AudioGe)),
    (0x1E3C_1390, Route::Audio(Dialect::AudioBc)),
];

const ABI2_SIGNATURES: &[(u32, Route)] = &[
    (0x1118_1350, Route::Audio(Dialect::NeadMk)),
    (0x1118_12E0, Route::Audio(Dialect::NeadSfj)),
    (0x1104_12AC, Route::Audio(Dialect::NeadWrjb)),
    (0x1104_12CC, Route::Audio(Dialect::NeadSf)),
    (0x1CD0_1250, Route::Audio(Dialect::NeadFz)),
    (0x1F08_122C, Route::Audio(Dialect::NeadYs)),
    (0x1F38_122C, Route::Audio(Dialect::Nead1080)),
    (0x1F68_1230, Route::Audio(Dialect::NeadOot)),
    (0x1F80_1250, Route::Audio(Dialect::NeadMm)),
    (0x1094_11F8, Route::Audio(Dialect::NeadMmb)),
    (0x1EAC_11B8, Route::Audio(Dialect::NeadAc)),
    (0x0001_0010, Route::Forward(Collaborator::MusyxV2)),
];

const ABI3_SIGNATURES: &[(u32, Route)] = &[
    (0x0000_0001, Route::Forward(Collaborator::MusyxV1)),
    (0x0000_127C, Route::Audio(Dialect::Naudio)),
    (0x0000_1280, Route::Audio(Dialect::NaudioBk)),
    (0x1C58_126C, Route::Audio(Dialect::NaudioDk)),
    (0x1AE8_143C, Route::Audio(Dialect::NaudioMp3)),
    (0x1AB0_140C, Route::Audio(Dialect::NaudioCbfd)),
];

const CHECKSUMS: &[(u32, Route)] = &[
    // StoreVe12 (Zelda OoT)
    (0x0000_0278, Route::Nothing),
    // Twintris graphics
    (0x0002_12EE, Route::Forward(Collaborator::Gfx)),
    (0x0002_C85A, Route::Forward(Collaborator::JpegPs0)),
    (0x0002_CAA6, Route::Forward(Collaborator::JpegPs)),
    (0x0001_30DE, Route::Forward(Collaborator::JpegOb)),
    (0x0002_78B0, Route::Forward(Collaborator::JpegOb)),
];

const CICX105_SUMS: [u32; 2] = [0x9E2, 0x9F2];

/// Sum of all bytes, wrapping.
pub fn sum_bytes(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |sum, &b| sum.wrapping_add(u32::from(b)))
}

/// Checksum of the task's ucode image.
pub fn ucode_sum(mem: &RspMemory, task: &TaskDescriptor) -> u32 {
    let size = task.ucode_size.min(UCODE_SUM_LIMIT) >> 1;
    sum_bytes(&mem.rdram_bytes(task.ucode, size as usize))
}

/// Checksum of a ucode started without a task descriptor.
pub fn imem_sum(mem: &RspMemory) -> u32 {
    sum_bytes(&mem.imem.as_slice()[..IMEM_SUM_SIZE])
}

/// Whether a non-task IMEM checksum is the CIC x105 boot ucode.
pub fn is_cicx105(sum: u32) -> bool {
    CICX105_SUMS.contains(&sum)
}

/// Family and lookup key from the ucode data header.
pub fn classify(mem: &RspMemory, ucode_data: u32) -> (UcodeFamily, u32) {
    let word = |offset: u32| mem.rdram.u32(ucode_data.wrapping_add(offset));
    if word(0x00) == 0x0000_0001 {
        if word(0x30) == 0xF000_0F00 {
            (UcodeFamily::Abi1, word(0x28))
        } else {
            (UcodeFamily::Abi2, word(0x10))
        }
    } else {
        (UcodeFamily::Abi3, word(0x10))
    }
}

/// Lookup tables for both fingerprints, built once per HLE instance.
#[derive(Debug, Clone)]
pub struct Fingerprints {
    signatures: HashMap<UcodeFamily, HashMap<u32, Route>>,
    checksums: HashMap<u32, Route>,
}

impl Fingerprints {
    /// Built-in tables plus `extra` checksum routes. Built-in checksums win
    /// over conflicting extras.
    pub fn new(extra: &[(u32, Dialect)]) -> Self {
        let signatures = [
            (UcodeFamily::Abi1, ABI1_SIGNATURES),
            (UcodeFamily::Abi2, ABI2_SIGNATURES),
            (UcodeFamily::Abi3, ABI3_SIGNATURES),
        ]
        .into_iter()
        .map(|(family, table)| (family, table.iter().copied().collect()))
        .collect();

        let mut checksums: HashMap<u32, Route> = CHECKSUMS.iter().copied().collect();
        for &(sum, dialect) in extra {
            if let Some(existing) = checksums.get(&sum) {
                log(LogCategory::Task, LogLevel::Warn, || {
                    format!(
                        "Ignoring checksum {:x} -> {}: already routes to {:?}",
                        sum, dialect, existing
                    )
                });
                continue;
            }
            checksums.insert(sum, Route::Audio(dialect));
        }

        Self {
            signatures,
            checksums,
        }
    }

    /// Tables with the `extra_checksums` of `config`. Entries that do not
    /// parse or name no dialect are logged and skipped.
    pub fn from_config(config: &HleConfig) -> Self {
        let mut extra = Vec::new();
        for (key, name) in &config.extra_checksums {
            let sum = match parse_checksum_key(key) {
                Ok(sum) => sum,
                Err(e) => {
                    log(LogCategory::Task, LogLevel::Warn, || e.to_string());
                    continue;
                }
            };
            match Dialect::from_name(name) {
                Some(dialect) => extra.push((sum, dialect)),
                None => log(LogCategory::Task, LogLevel::Warn, || {
                    format!("Unknown dialect {:?} for checksum {:x}", name, sum)
                }),
            }
        }
        Self::new(&extra)
    }

    /// Identify an audio ucode from its data segment.
    pub fn identify_audio(&self, mem: &RspMemory, ucode_data: u32) -> Option<Route> {
        let (family, key) = classify(mem, ucode_data);
        let route = self
            .signatures
            .get(&family)
            .and_then(|table| table.get(&key))
            .copied();
        if route.is_none() {
            log(LogCategory::Task, LogLevel::Warn, || {
                format!("{} identification regression: v={:08x}", family, key)
            });
        }
        route
    }

    /// Identify a ucode from its byte sum.
    pub fn identify_checksum(&self, sum: u32) -> Option<Route> {
        self.checksums.get(&sum).copied()
    }

    /// Every fast-path signature, for diagnostics and tests.
    pub fn signatures(&self) -> impl Iterator<Item = (UcodeFamily, u32, Route)> + '_ {
        self.signatures.iter().flat_map(|(&family, table)| {
            table.iter().map(move |(&key, &route)| (family, key, route))
        })
    }
}

impl Default for Fingerprints {
    fn default() -> Self {
        Self::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const UCODE_DATA: u32 = 0x1000;

    fn header(mem: &mut RspMemory, word0: u32, at_0x10: u32, at_0x28: u32, at_0x30: u32) {
        mem.rdram.set_u32(UCODE_DATA, word0);
        mem.rdram.set_u32(UCODE_DATA + 0x10, at_0x10);
        mem.rdram.set_u32(UCODE_DATA + 0x28, at_0x28);
        mem.rdram.set_u32(UCODE_DATA + 0x30, at_0x30);
    }

    #[test]
    fn test_sum_bytes_wraps() {
        assert_eq!(sum_bytes(&[]), 0);
        assert_eq!(sum_bytes(&[0xFF, 0x01, 0x10]), 0x110);
    }

    #[test]
    fn test_family_classification() {
        let mut mem = RspMemory::new(0x10000);
        header(&mut mem, 1, 0x1F68_1230, 0x1E24_138C, 0xF000_0F00);
        assert_eq!(classify(&mem, UCODE_DATA), (UcodeFamily::Abi1, 0x1E24_138C));

        header(&mut mem, 1, 0x1F68_1230, 0x1E24_138C, 0);
        assert_eq!(classify(&mem, UCODE_DATA), (UcodeFamily::Abi2, 0x1F68_1230));

        header(&mut mem, 2, 0x0000_127C, 0x1E24_138C, 0xF000_0F00);
        assert_eq!(classify(&mem, UCODE_DATA), (UcodeFamily::Abi3, 0x0000_127C));
    }

    #[test]
    fn test_identify_audio() {
        let fp = Fingerprints::default();
        let mut mem = RspMemory::new(0x10000);

        header(&mut mem, 1, 0, 0x1DC8_138C, 0xF000_0F00);
        assert_eq!(
            fp.identify_audio(&mem, UCODE_DATA),
            Some(Route::Audio(Dialect::AudioGe))
        );

        header(&mut mem, 1, 0x0001_0010, 0, 0);
        assert_eq!(
            fp.identify_audio(&mem, UCODE_DATA),
            Some(Route::Forward(Collaborator::MusyxV2))
        );

        header(&mut mem, 0, 0x1AB0_140C, 0, 0);
        assert_eq!(
            fp.identify_audio(&mem, UCODE_DATA),
            Some(Route::Audio(Dialect::NaudioCbfd))
        );

        // an ABI2 key under ABI3 is a miss
        header(&mut mem, 0, 0x1F68_1230, 0, 0);
        assert_eq!(fp.identify_audio(&mem, UCODE_DATA), None);
    }

    #[test]
    fn test_every_dialect_has_exactly_one_signature() {
        let fp = Fingerprints::default();
        let mut seen = HashSet::new();
        for (_, _, route) in fp.signatures() {
            if let Route::Audio(dialect) = route {
                assert!(seen.insert(dialect), "{} listed twice", dialect);
            }
        }
        assert_eq!(seen.len(), Dialect::ALL.len());
    }

    #[test]
    fn test_checksum_table() {
        let fp = Fingerprints::default();
        assert_eq!(fp.identify_checksum(0x278), Some(Route::Nothing));
        assert_eq!(
            fp.identify_checksum(0x278B0),
            Some(Route::Forward(Collaborator::JpegOb))
        );
        assert_eq!(fp.identify_checksum(0x1234), None);
        assert!(is_cicx105(0x9F2));
        assert!(!is_cicx105(0x9E3));
    }

    #[test]
    fn test_extra_checksums_from_config() {
        let mut config = HleConfig::default();
        for (key, name) in [
            ("0x4242", "nead_oot"),
            ("278", "audio"),
            ("0x5151", "no_such_dialect"),
            ("zz", "audio"),
        ] {
            config
                .extra_checksums
                .insert(key.to_string(), name.to_string());
        }
        let fp = Fingerprints::from_config(&config);
        assert_eq!(
            fp.identify_checksum(0x4242),
            Some(Route::Audio(Dialect::NeadOot))
        );
        // built-in entry kept
        assert_eq!(fp.identify_checksum(0x278), Some(Route::Nothing));
        assert_eq!(fp.identify_checksum(0x5151), None);
    }

    #[test]
    fn test_ucode_sum_is_capped() {
        let mut mem = RspMemory::new(0x10000);
        mem.rdram.store_u8(&[1; 0x1000], 0x2000);
        let task = TaskDescriptor {
            ucode: 0x2000,
            ucode_size: 0x1000,
            ..Default::default()
        };
        assert_eq!(ucode_sum(&mem, &task), 0xF80 >> 1);

        let task = TaskDescriptor {
            ucode_size: 0x100,
            ..task
        };
        assert_eq!(ucode_sum(&mem, &task), 0x80);
    }
}
