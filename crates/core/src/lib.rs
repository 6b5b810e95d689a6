//! Core primitives shared by the HLE crates.
//!
//! - [`logging`]: category/level logging with rate limiting and an async file sink
//! - [`config`]: JSON-backed runtime configuration
//! - [`Coprocessor`]: the run-to-completion interface a frontend drives

pub mod config;
pub mod logging;

pub mod types {
    /// One signed 16-bit PCM sample as stored in DMEM/RDRAM.
    pub type AudioSample = i16;

    /// Saturate a wide intermediate to the 16-bit sample range.
    #[inline]
    pub fn clamp_s16(x: i32) -> AudioSample {
        x.clamp(i16::MIN as i32, i16::MAX as i32) as AudioSample
    }
}

/// A coprocessor that runs one queued task to completion per kick.
///
/// There is no cycle-accurate timing: implementations receive an opaque
/// cycle budget and hand it back.
pub trait Coprocessor {
    /// Restore power-on state (memories cleared, status halted)
    fn reset(&mut self);

    /// Run the pending task and return the cycle budget.
    fn do_cycles(&mut self, cycles: u32) -> u32;
}
