//! Audio ucode dialects and their opcode tables.

use super::{audio, naudio, nead, OpcodeTable};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// One audio ucode variant. Each has its own opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    /// Standard ABI (most games)
    Audio,
    /// GoldenEye
    AudioGe,
    /// Blast Corps, Diddy Kong Racing
    AudioBc,
    /// Mario Kart, Wave Race (E)
    NeadMk,
    /// Star Fox (J)
    NeadSfj,
    /// Wave Race (J RevB)
    NeadWrjb,
    /// Star Fox / Lylat Wars (except J)
    NeadSf,
    /// F-Zero X
    NeadFz,
    /// Yoshi's Story
    NeadYs,
    /// 1080 Snowboarding
    Nead1080,
    /// Zelda OoT, Zelda MM (J, J RevA)
    NeadOot,
    /// Zelda MM, Pokemon Stadium 2
    NeadMm,
    /// Zelda MM (E Beta)
    NeadMmb,
    /// Animal Crossing
    NeadAc,
    /// Many games
    Naudio,
    /// Banjo-Kazooie
    NaudioBk,
    /// Donkey Kong 64
    NaudioDk,
    /// Banjo-Tooie, Jet Force Gemini, Perfect Dark, ...
    NaudioMp3,
    /// Conker's Bad Fur Day
    NaudioCbfd,
}

impl Dialect {
    pub const ALL: [Dialect; 19] = [
        Dialect::Audio,
        Dialect::AudioGe,
        Dialect::AudioBc,
        Dialect::NeadMk,
        Dialect::NeadSfj,
        Dialect::NeadWrjb,
        Dialect::NeadSf,
        Dialect::NeadFz,
        Dialect::NeadYs,
        Dialect::Nead1080,
        Dialect::NeadOot,
        Dialect::NeadMm,
        Dialect::NeadMmb,
        Dialect::NeadAc,
        Dialect::Naudio,
        Dialect::NaudioBk,
        Dialect::NaudioDk,
        Dialect::NaudioMp3,
        Dialect::NaudioCbfd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Audio => "audio",
            Dialect::AudioGe => "audio_ge",
            Dialect::AudioBc => "audio_bc",
            Dialect::NeadMk => "nead_mk",
            Dialect::NeadSfj => "nead_sfj",
            Dialect::NeadWrjb => "nead_wrjb",
            Dialect::NeadSf => "nead_sf",
            Dialect::NeadFz => "nead_fz",
            Dialect::NeadYs => "nead_ys",
            Dialect::Nead1080 => "nead_1080",
            Dialect::NeadOot => "nead_oot",
            Dialect::NeadMm => "nead_mm",
            Dialect::NeadMmb => "nead_mmb",
            Dialect::NeadAc => "nead_ac",
            Dialect::Naudio => "naudio",
            Dialect::NaudioBk => "naudio_bk",
            Dialect::NaudioDk => "naudio_dk",
            Dialect::NaudioMp3 => "naudio_mp3",
            Dialect::NaudioCbfd => "naudio_cbfd",
        }
    }

    /// Parse a name as produced by [`Dialect::name`] (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// The opcode table for this dialect, built on first use.
    pub fn table(self) -> &'static OpcodeTable {
        static TABLES: OnceLock<Vec<OpcodeTable>> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Self::ALL.iter().map(|&d| build_table(d)).collect());
        &tables[self.index()]
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Dialect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn build_table(dialect: Dialect) -> OpcodeTable {
    let name = dialect.name();
    match dialect {
        Dialect::Audio | Dialect::AudioGe | Dialect::AudioBc => {
            OpcodeTable::new(name, &audio::handlers(dialect))
        }
        Dialect::Naudio
        | Dialect::NaudioBk
        | Dialect::NaudioDk
        | Dialect::NaudioMp3
        | Dialect::NaudioCbfd => OpcodeTable::new(name, &naudio::handlers(dialect)),
        _ => OpcodeTable::new(name, nead::handlers(dialect)),
    }
}
