//! High-level emulation of the N64 RSP.
//!
//! Instead of executing RSP microcode, the HLE recognizes which ucode a task
//! was launched with and reproduces its effect:
//!
//! - **Dispatch**: classify the task, fingerprint the ucode, route it
//! - **Audio lists**: interpret audio command lists for 19 ucode dialects
//! - **DSP**: bit-exact ADPCM, resampling, envelopes, filters, mixing
//! - **Host**: graphics, JPEG, MusyX and MP3 are handed to the emulator
//!
//! Memory is owned by the caller and borrowed for one dispatch. Dispatch
//! itself never fails: unknown ucodes produce diagnostics and no output.

pub mod alist;
pub mod dispatch;
pub mod dsp;
pub mod dump;
pub mod host;
pub mod memory;
pub mod task;

pub use alist::Dialect;
pub use host::{Collaborator, Host, NullHost};
pub use memory::RspMemory;
pub use task::TaskDescriptor;

use crc32fast::Hasher;
use dispatch::{Fingerprints, Route};
use dump::{Dumper, UCODE_DUMP_SIZE};
use hle_core::config::{ConfigError, HleConfig};
use hle_core::logging::{log, LogCategory, LogLevel};
use hle_core::Coprocessor;
use serde::Serialize;
use task::{M_AUDTASK, M_GFXTASK, M_SHOWCFB};
use thiserror::Error;

/// SP status register bits
pub const SP_STATUS_HALT: u32 = 0x0001;
pub const SP_STATUS_BROKE: u32 = 0x0002;
pub const SP_STATUS_INTR_ON_BREAK: u32 = 0x0040;
/// SIG2, set by task ucodes when they finish
pub const SP_STATUS_TASKDONE: u32 = 0x0200;

#[derive(Error, Debug)]
pub enum HleError {
    #[error("DMEM snapshot is {0} bytes, expected 4096")]
    DmemSize(usize),
    #[error("IMEM snapshot is {0} bytes, expected 4096")]
    ImemSize(usize),
    #[error("RDRAM snapshot size {0:#x} is not a power of two")]
    RdramSize(usize),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What one dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// An audio list was interpreted
    Audio { dialect: Dialect, commands: u32 },
    /// The task was handed to the host
    Forwarded { collaborator: Collaborator },
    /// Known ucode with nothing to do
    Nothing,
    /// Unrecognized task; diagnostics were written
    UnknownTask { sum: u32, ucode_crc32: u32 },
    /// Unrecognized non-task ucode; diagnostics were written
    UnknownNonTask { sum: u32 },
}

/// The RSP HLE: configuration, fingerprint tables and the SP registers it
/// owns. One instance serves every task of an emulation session.
#[derive(Debug)]
pub struct RspHle {
    config: HleConfig,
    fingerprints: Fingerprints,
    dumper: Dumper,
    sp_status: u32,
    sp_pc: u32,
    last_outcome: Option<DispatchOutcome>,
}

impl RspHle {
    pub fn new(config: HleConfig) -> Self {
        let fingerprints = Fingerprints::from_config(&config);
        let dumper = Dumper::new(config.dump_dir.clone(), config.dumps_enabled);
        Self {
            config,
            fingerprints,
            dumper,
            sp_status: SP_STATUS_HALT,
            sp_pc: 0,
            last_outcome: None,
        }
    }

    pub fn config(&self) -> &HleConfig {
        &self.config
    }

    pub fn sp_status(&self) -> u32 {
        self.sp_status
    }

    /// Set the SP status register, e.g. to clear HALT before a task or to
    /// enable the break interrupt.
    pub fn set_sp_status(&mut self, value: u32) {
        self.sp_status = value;
    }

    /// The SP program counter, only used in diagnostics.
    pub fn set_sp_pc(&mut self, pc: u32) {
        self.sp_pc = pc;
    }

    pub fn last_outcome(&self) -> Option<DispatchOutcome> {
        self.last_outcome
    }

    /// Run whatever the RSP was started with. Returns `cycles` unchanged.
    pub fn do_rsp_cycles(&mut self, mem: &mut RspMemory, host: &mut dyn Host, cycles: u32) -> u32 {
        let task = TaskDescriptor::read(&mem.dmem);
        let outcome = if task.is_task() {
            let outcome = self
                .try_fast_task_dispatching(mem, host, &task)
                .unwrap_or_else(|| self.normal_task_dispatching(mem, host, &task));
            self.rsp_break(host, SP_STATUS_TASKDONE);
            outcome
        } else {
            let outcome = self.non_task_dispatching(mem, host);
            self.rsp_break(host, 0);
            outcome
        };

        log(LogCategory::Task, LogLevel::Debug, || {
            format!("Dispatch: {:?}", outcome)
        });
        self.last_outcome = Some(outcome);
        cycles
    }

    /// Clear the RSP memories when the game is unloaded.
    pub fn rom_closed(&mut self, mem: &mut RspMemory) {
        mem.dmem.fill(0);
        mem.imem.fill(0);
    }

    fn rsp_break(&mut self, host: &mut dyn Host, setbits: u32) {
        self.sp_status |= setbits | SP_STATUS_BROKE | SP_STATUS_HALT;
        if self.sp_status & SP_STATUS_INTR_ON_BREAK != 0 {
            host.raise_sp_interrupt();
        }
    }

    fn forward(
        &self,
        mem: &mut RspMemory,
        host: &mut dyn Host,
        collaborator: Collaborator,
    ) -> DispatchOutcome {
        log(LogCategory::Task, LogLevel::Debug, || {
            format!("Forwarding task to {}", collaborator)
        });
        host.invoke(collaborator, mem);
        DispatchOutcome::Forwarded { collaborator }
    }

    fn run_route(
        &self,
        mem: &mut RspMemory,
        host: &mut dyn Host,
        task: &TaskDescriptor,
        route: Route,
    ) -> DispatchOutcome {
        match route {
            Route::Audio(dialect) => {
                let commands =
                    alist::process(mem, host, dialect, task.data_ptr, task.data_size);
                DispatchOutcome::Audio { dialect, commands }
            }
            Route::Forward(collaborator) => self.forward(mem, host, collaborator),
            Route::Nothing => DispatchOutcome::Nothing,
        }
    }

    /// Identify the task from its type and, for audio, its data header.
    fn try_fast_task_dispatching(
        &self,
        mem: &mut RspMemory,
        host: &mut dyn Host,
        task: &TaskDescriptor,
    ) -> Option<DispatchOutcome> {
        match task.task_type {
            M_GFXTASK if self.config.forward_gfx => Some(self.forward(mem, host, Collaborator::Gfx)),
            M_AUDTASK if self.config.forward_audio => {
                Some(self.forward(mem, host, Collaborator::Alist))
            }
            M_AUDTASK => {
                let route = self.fingerprints.identify_audio(mem, task.ucode_data)?;
                Some(self.run_route(mem, host, task, route))
            }
            M_SHOWCFB => Some(self.forward(mem, host, Collaborator::ShowCfb)),
            _ => None,
        }
    }

    /// Identify the task from the byte sum of its ucode.
    fn normal_task_dispatching(
        &self,
        mem: &mut RspMemory,
        host: &mut dyn Host,
        task: &TaskDescriptor,
    ) -> DispatchOutcome {
        let sum = dispatch::ucode_sum(mem, task);
        match self.fingerprints.identify_checksum(sum) {
            Some(Route::Forward(Collaborator::Gfx)) if !self.config.forward_gfx => {
                self.handle_unknown_task(mem, task, sum)
            }
            Some(route) => self.run_route(mem, host, task, route),
            None => self.handle_unknown_task(mem, task, sum),
        }
    }

    fn non_task_dispatching(&self, mem: &mut RspMemory, host: &mut dyn Host) -> DispatchOutcome {
        let sum = dispatch::imem_sum(mem);
        if dispatch::is_cicx105(sum) {
            return self.forward(mem, host, Collaborator::Cicx105);
        }

        log(LogCategory::Task, LogLevel::Warn, || {
            format!("unknown RSP code: sum: {:x} PC:{:x}", sum, self.sp_pc)
        });
        self.dumper.dump_unknown_non_task(mem, sum);
        DispatchOutcome::UnknownNonTask { sum }
    }

    fn handle_unknown_task(
        &self,
        mem: &RspMemory,
        task: &TaskDescriptor,
        sum: u32,
    ) -> DispatchOutcome {
        log(LogCategory::Task, LogLevel::Warn, || {
            format!("unknown OSTask: sum {:x} PC:{:x}", sum, self.sp_pc)
        });
        self.dumper.dump_unknown_task(mem, task, sum);

        let mut hasher = Hasher::new();
        hasher.update(&mem.rdram_bytes(task.ucode, UCODE_DUMP_SIZE));
        DispatchOutcome::UnknownTask {
            sum,
            ucode_crc32: hasher.finalize(),
        }
    }
}

impl Default for RspHle {
    fn default() -> Self {
        Self::new(HleConfig::default())
    }
}

/// An RSP bundled with the memory and host it runs against.
pub struct Rsp<H: Host> {
    pub hle: RspHle,
    pub mem: RspMemory,
    pub host: H,
}

impl<H: Host> Rsp<H> {
    pub fn new(config: HleConfig, host: H) -> Self {
        let mem = RspMemory::new(config.rdram_size);
        Self {
            hle: RspHle::new(config),
            mem,
            host,
        }
    }
}

impl<H: Host> Coprocessor for Rsp<H> {
    fn reset(&mut self) {
        self.hle.rom_closed(&mut self.mem);
        self.mem.rdram.fill(0);
        self.hle.set_sp_status(SP_STATUS_HALT);
    }

    fn do_cycles(&mut self, cycles: u32) -> u32 {
        self.hle.do_rsp_cycles(&mut self.mem, &mut self.host, cycles)
    }
}
