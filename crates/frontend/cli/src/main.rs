use anyhow::{Context, Result};
use clap::Parser;
use hle_core::config::HleConfig;
use hle_core::logging::{LogConfig, LogLevel};
use rsp_hle::{Collaborator, DispatchOutcome, Host, RspHle, RspMemory, TaskDescriptor};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run one RSP dispatch over a memory snapshot.
#[derive(Parser)]
#[command(name = "rsp-hle")]
struct Args {
    /// DMEM snapshot (4096 bytes, task descriptor at 0xFC0)
    #[arg(long)]
    dmem: PathBuf,

    /// IMEM snapshot (4096 bytes); zeroes when omitted
    #[arg(long)]
    imem: Option<PathBuf>,

    /// RDRAM snapshot (power-of-two size)
    #[arg(long)]
    rdram: PathBuf,

    /// JSON config file (see HleConfig)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for diagnostic dumps (overrides the config)
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Write RDRAM here after the dispatch
    #[arg(long)]
    out_rdram: Option<PathBuf>,

    /// Write DMEM here after the dispatch
    #[arg(long)]
    out_dmem: Option<PathBuf>,

    /// Global HLE log level: off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Send HLE logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Cycle budget handed to the RSP
    #[arg(long, default_value_t = 0)]
    cycles: u32,
}

/// Collaborators are not available headless: record the requests.
#[derive(Default)]
struct HeadlessHost {
    forwarded: Vec<Collaborator>,
    mp3_frames: u32,
    interrupts: u32,
}

impl Host for HeadlessHost {
    fn invoke(&mut self, collaborator: Collaborator, _mem: &mut RspMemory) {
        log::info!("task forwarded to {}", collaborator);
        self.forwarded.push(collaborator);
    }

    fn mp3(&mut self, index: u32, address: u32, _mem: &mut RspMemory) {
        log::info!("mp3 frame requested: index {} at {:#08x}", index, address);
        self.mp3_frames += 1;
    }

    fn raise_sp_interrupt(&mut self) {
        self.interrupts += 1;
    }
}

#[derive(Serialize)]
struct Summary {
    task: TaskDescriptor,
    is_task: bool,
    outcome: Option<DispatchOutcome>,
    sp_status: u32,
    cycles: u32,
    forwarded: Vec<Collaborator>,
    mp3_frames: u32,
    interrupts: u32,
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HleConfig::try_load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HleConfig::default(),
    };
    if let Some(dir) = &args.dump_dir {
        config.dump_dir = dir.clone();
    }

    let log_config = LogConfig::global();
    let level = match &args.log_level {
        Some(name) => Some(
            LogLevel::from_str(name)
                .with_context(|| format!("invalid log level {:?}", name))?,
        ),
        None => config.log_level(),
    };
    if let Some(level) = level {
        log_config.set_global_level(level);
    }
    if let Some(path) = &args.log_file {
        log_config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }

    let dmem = read(&args.dmem)?;
    let imem = match &args.imem {
        Some(path) => read(path)?,
        None => vec![0; rsp_hle::memory::IMEM_SIZE],
    };
    let rdram = read(&args.rdram)?;
    let mut mem = RspMemory::from_snapshots(&dmem, &imem, &rdram)?;

    let task = TaskDescriptor::read(&mem.dmem);
    let mut hle = RspHle::new(config);
    let mut host = HeadlessHost::default();
    let cycles = hle.do_rsp_cycles(&mut mem, &mut host, args.cycles);

    if let Some(path) = &args.out_rdram {
        fs::write(path, mem.rdram.as_slice())
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.out_dmem {
        fs::write(path, mem.dmem.as_slice())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let summary = Summary {
        task,
        is_task: task.is_task(),
        outcome: hle.last_outcome(),
        sp_status: hle.sp_status(),
        cycles,
        forwarded: host.forwarded,
        mp3_frames: host.mp3_frames,
        interrupts: host.interrupts,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    log_config.clear_log_file();
    Ok(())
}
