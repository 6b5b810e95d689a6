//! Interface to the emulator hosting the HLE.
//!
//! Tasks the HLE does not emulate itself (graphics, JPEG decoding, MusyX,
//! the MP3 command, ...) are handed to the host through [`Host`]. Every
//! method has a no-op default so a host only implements what it supports.

use crate::memory::RspMemory;
use serde::Serialize;
use std::fmt;

/// An external handler the dispatcher can route a task to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    /// Graphics display list, for the video plugin
    Gfx,
    /// Audio list, for an external audio plugin
    Alist,
    /// Show the current framebuffer
    ShowCfb,
    /// JPEG decode (Pokemon Stadium, first variant)
    JpegPs0,
    /// JPEG decode (Pokemon Stadium)
    JpegPs,
    /// JPEG decode (Ogre Battle)
    JpegOb,
    /// CIC-x105 boot ucode
    Cicx105,
    /// MusyX audio, first revision
    MusyxV1,
    /// MusyX audio, second revision
    MusyxV2,
}

impl Collaborator {
    pub fn name(self) -> &'static str {
        match self {
            Collaborator::Gfx => "gfx",
            Collaborator::Alist => "alist",
            Collaborator::ShowCfb => "show_cfb",
            Collaborator::JpegPs0 => "jpeg_ps0",
            Collaborator::JpegPs => "jpeg_ps",
            Collaborator::JpegOb => "jpeg_ob",
            Collaborator::Cicx105 => "cicx105",
            Collaborator::MusyxV1 => "musyx_v1",
            Collaborator::MusyxV2 => "musyx_v2",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callbacks into the hosting emulator.
pub trait Host {
    /// Process a task the HLE does not emulate. The task descriptor is in
    /// DMEM at 0xFC0.
    fn invoke(&mut self, _collaborator: Collaborator, _mem: &mut RspMemory) {}

    /// Decode one MP3 frame (naudio MP3 command).
    fn mp3(&mut self, _index: u32, _address: u32, _mem: &mut RspMemory) {}

    /// Raise the SP interrupt in the MIPS interface.
    fn raise_sp_interrupt(&mut self) {}
}

/// A host that supports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}
