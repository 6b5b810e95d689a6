//! Audio command lists.
//!
//! An audio task's data segment is a list of 64-bit commands. The top byte
//! of the first word (masked to 7 bits) selects one of 128 opcode slots;
//! what each slot does depends on the ucode dialect that built the list.
//!
//! Three command-set families exist:
//! - [`audio`]: the standard ABI with a segment table and a DMEM base offset
//! - [`naudio`]: a fixed DMEM layout with the count baked into the ucode
//! - [`nead`]: operands carry every address, plus filters and a custom
//!   envelope mixer

pub mod audio;
pub mod dialect;
pub mod naudio;
pub mod nead;

use crate::dsp::adpcm::CODEBOOK_LEN;
use crate::host::Host;
use crate::memory::RspMemory;
use hle_core::logging::{log, LogCategory, LogLevel};

pub use dialect::Dialect;

/// Number of opcode slots
pub const OPCODE_SLOTS: usize = 128;

/// One command handler: `(context, w1, w2)`
pub type Handler = fn(&mut AlistContext<'_>, u32, u32);

/// Setup registers written by one command and read by later ones.
///
/// Created zeroed for every audio task.
#[derive(Debug, Clone)]
pub struct AlistState {
    /// Main input buffer
    pub in_buf: u16,
    /// Main output buffer (dry left for the envelope mixers)
    pub out_buf: u16,
    /// Byte count used by the buffer-less commands
    pub count: u16,
    pub dry_right: u16,
    pub wet_left: u16,
    pub wet_right: u16,

    pub dry: i16,
    pub wet: i16,
    pub vol: [i16; 2],
    pub target: [i16; 2],
    pub rate: [i32; 2],

    /// ADPCM loop frame address
    pub loop_address: u32,
    /// ADPCM codebook, also the pole filter coefficients
    pub table: [i16; CODEBOOK_LEN],
    /// RDRAM segment bases (standard ABI)
    pub segments: [u32; 16],

    // nead envelope and filter registers
    pub env_values: [u16; 3],
    pub env_steps: [u16; 3],
    pub filter_count: u16,
    pub filter_lut_address: [u32; 2],
}

impl Default for AlistState {
    fn default() -> Self {
        Self {
            in_buf: 0,
            out_buf: 0,
            count: 0,
            dry_right: 0,
            wet_left: 0,
            wet_right: 0,
            dry: 0,
            wet: 0,
            vol: [0; 2],
            target: [0; 2],
            rate: [0; 2],
            loop_address: 0,
            table: [0; CODEBOOK_LEN],
            segments: [0; 16],
            env_values: [0; 3],
            env_steps: [0; 3],
            filter_count: 0,
            filter_lut_address: [0; 2],
        }
    }
}

impl AlistState {
    /// Load `count` 16-bit codebook entries from RDRAM, keeping what does not fit.
    pub fn load_codebook(&mut self, mem: &RspMemory, address: u32, count: usize) {
        let n = count.min(CODEBOOK_LEN);
        mem.rdram.load_i16(&mut self.table[..n], address);
    }
}

/// Everything a handler can touch while one command list runs.
pub struct AlistContext<'a> {
    pub mem: &'a mut RspMemory,
    pub host: &'a mut dyn Host,
    pub state: AlistState,
}

impl<'a> AlistContext<'a> {
    pub fn new(mem: &'a mut RspMemory, host: &'a mut dyn Host) -> Self {
        Self {
            mem,
            host,
            state: AlistState::default(),
        }
    }
}

/// Shared handler: does nothing.
pub(crate) fn spnoop(_ctx: &mut AlistContext<'_>, _w1: u32, _w2: u32) {}

/// Shared handler: an opcode the dialect defines but nobody implements.
pub(crate) fn unknown(_ctx: &mut AlistContext<'_>, w1: u32, w2: u32) {
    log(LogCategory::Alist, LogLevel::Warn, || {
        format!(
            "Unknown audio command {}: {:08x} {:08x}",
            (w1 >> 24) & 0x7F,
            w1,
            w2
        )
    });
}

/// 128-slot opcode -> handler table for one dialect.
pub struct OpcodeTable {
    name: &'static str,
    slots: [Option<Handler>; OPCODE_SLOTS],
}

impl OpcodeTable {
    /// Build a table from the handlers of the leading slots; the rest stay empty.
    pub fn new(name: &'static str, handlers: &[Handler]) -> Self {
        let mut slots: [Option<Handler>; OPCODE_SLOTS] = [None; OPCODE_SLOTS];
        for (slot, &handler) in slots.iter_mut().zip(handlers) {
            *slot = Some(handler);
        }
        Self { name, slots }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, acmd: usize) -> Option<Handler> {
        self.slots.get(acmd).copied().flatten()
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for OpcodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcodeTable")
            .field("name", &self.name)
            .field("slots", &self.len())
            .finish()
    }
}

/// Interpreter life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterState {
    Idle,
    Running,
    Halted,
}

/// Walks a command list and dispatches each command to its slot handler.
#[derive(Debug)]
pub struct Interpreter {
    table: &'static OpcodeTable,
    state: InterpreterState,
    address: u32,
    remaining: u32,
    executed: u32,
}

impl Interpreter {
    pub fn new(table: &'static OpcodeTable) -> Self {
        Self {
            table,
            state: InterpreterState::Idle,
            address: 0,
            remaining: 0,
            executed: 0,
        }
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    /// Commands executed since [`Interpreter::start`]
    pub fn executed(&self) -> u32 {
        self.executed
    }

    /// Point the interpreter at `size` bytes of commands at RDRAM `address`.
    /// A trailing partial command is ignored.
    pub fn start(&mut self, address: u32, size: u32) {
        self.address = address;
        self.remaining = size / 8;
        self.executed = 0;
        self.state = if self.remaining == 0 {
            InterpreterState::Halted
        } else {
            InterpreterState::Running
        };
        log(LogCategory::Alist, LogLevel::Debug, || {
            format!(
                "{}: {} commands at 0x{:06X}",
                self.table.name(),
                self.remaining,
                address
            )
        });
    }

    /// Execute one command. Returns the state after it.
    pub fn step(&mut self, ctx: &mut AlistContext<'_>) -> InterpreterState {
        if self.state != InterpreterState::Running {
            return self.state;
        }

        let w1 = ctx.mem.rdram.u32(self.address);
        let w2 = ctx.mem.rdram.u32(self.address.wrapping_add(4));
        self.address = self.address.wrapping_add(8);

        let acmd = ((w1 >> 24) & 0x7F) as usize;
        log(LogCategory::Alist, LogLevel::Trace, || {
            format!("acmd {:02X}: {:08X} {:08X}", acmd, w1, w2)
        });
        if let Some(handler) = self.table.get(acmd) {
            handler(ctx, w1, w2);
        }

        self.executed += 1;
        self.remaining -= 1;
        if self.remaining == 0 {
            self.state = InterpreterState::Halted;
        }
        self.state
    }

    /// Step until the list is exhausted; returns the number of commands executed.
    pub fn run(&mut self, ctx: &mut AlistContext<'_>) -> u32 {
        while self.step(ctx) == InterpreterState::Running {}
        self.executed
    }
}

/// Run the command list of `size` bytes at `address` with a fresh state.
pub fn process(
    mem: &mut RspMemory,
    host: &mut dyn Host,
    dialect: Dialect,
    address: u32,
    size: u32,
) -> u32 {
    let mut ctx = AlistContext::new(mem, host);
    let mut interpreter = Interpreter::new(dialect.table());
    interpreter.start(address, size);
    interpreter.run(&mut ctx)
}
