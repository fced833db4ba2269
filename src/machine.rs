use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::cpu::{Cpu, CpuConfig, Fault};
use crate::exec::IntExecutor;
use crate::image::{LoadedImage, TextSegment};
use crate::isa::axp::AxpDecoder;
use crate::memory::{AddressSpace, Bus, LayoutError};

/// Appended to the transcript of a run that returned through the sentinel.
pub const SUCCESS_MARKER: &str = "completed.";
pub const FAILURE_MARKER: &str = "execution failed.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    Halted,
    Faulted { pc: u64, message: String },
    StepLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub steps: u64,
    pub pc: u64,
    pub registers: [u64; 32],
    pub output: String,
    pub transcript: String,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Halted
    }
}

/// One image bound to an address space, ready to run from its entry point.
pub struct Machine {
    pub cpu: Cpu,
    pub mem: AddressSpace,
    config: CpuConfig,
    stack_end: u64,
    entry: u64,
    text: TextSegment,
    dec: AxpDecoder,
    exec: IntExecutor,
}

impl Machine {
    /// Fails when the configured stack or the image cannot be mapped.
    pub fn new(image: &LoadedImage, config: CpuConfig) -> Result<Self, LayoutError> {
        let mem =
            AddressSpace::new(image, config.stack_start, config.stack_size, config.console_addr)?;
        let stack_end = config.stack_end().ok_or(LayoutError::StackWraps {
            start: config.stack_start,
            size: config.stack_size,
        })?;
        Ok(Self {
            cpu: Cpu::new(),
            mem,
            config,
            stack_end,
            entry: image.entry,
            text: image.text,
            dec: AxpDecoder::new(),
            exec: IntExecutor,
        })
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Address whose appearance in the PC ends the run successfully.
    pub fn sentinel(&self) -> u64 {
        self.stack_end
    }

    /// Puts memory and registers back in their start-of-run state.
    pub fn reset(&mut self) {
        self.mem.reset();
        self.cpu.reset(self.entry, self.stack_end);
    }

    /// Executes one instruction, checking the PC against the text segment
    /// first.
    pub fn step(&mut self) -> Result<(), Fault> {
        let pc = self.cpu.pc;
        if !self.text.contains(pc) {
            return Err(Fault::InvalidPc { pc });
        }
        if tracing::enabled!(tracing::Level::TRACE) {
            if let Ok(raw) = self.mem.read_u32(pc) {
                let mnemonic = crate::decoder::decode(raw).mnemonic();
                trace!(
                    pc = format_args!("{pc:#x}"),
                    raw = format_args!("{raw:08x}"),
                    "{mnemonic}"
                );
            }
        }
        self.cpu.step(&mut self.mem, &self.dec, &self.exec)
    }

    /// Runs from a fresh state until the sentinel is reached, a fault occurs
    /// or the step cap is hit.
    pub fn run(&mut self) -> RunReport {
        self.reset();
        let sentinel = self.sentinel();
        info!(entry = format_args!("{:#x}", self.entry), "run start");

        let mut steps = 0u64;
        let status = loop {
            if self.cpu.pc == sentinel {
                info!(steps, "halted");
                break RunStatus::Halted;
            }
            if self.config.max_steps.is_some_and(|cap| steps >= cap) {
                warn!(steps, pc = format_args!("{:#x}", self.cpu.pc), "step limit reached");
                break RunStatus::StepLimit;
            }
            if let Err(fault) = self.step() {
                warn!(%fault, "run faulted");
                break RunStatus::Faulted { pc: fault.pc(), message: fault.to_string() };
            }
            steps += 1;
        };

        let output = self.mem.take_output();
        let mut transcript = format!("pc={:016x}: start\n{output}\n---\n", self.entry);
        match &status {
            RunStatus::Halted => transcript += SUCCESS_MARKER,
            RunStatus::Faulted { message, .. } => {
                transcript += &format!("{message}\n{FAILURE_MARKER}");
            }
            RunStatus::StepLimit => {
                let pc = self.cpu.pc;
                transcript += &format!("step limit of {steps} reached at pc={pc:#018x}\n{FAILURE_MARKER}");
            }
        }

        RunReport {
            status,
            steps,
            pc: self.cpu.pc,
            registers: self.cpu.regs.snapshot(),
            output,
            transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_stack_top() {
        let img = LoadedImage::from_words(0x1000, &[0x6BFA_8001]);
        let m = Machine::new(&img, CpuConfig::default()).unwrap();
        assert_eq!(m.sentinel(), 0x0100_0000);
    }

    #[test]
    fn ret_halts_immediately() {
        let img = LoadedImage::from_words(0x1000, &[0x6BFA_8001]);
        let report = Machine::new(&img, CpuConfig::default()).unwrap().run();
        assert!(report.succeeded());
        assert_eq!(report.steps, 1);
        assert!(report.transcript.ends_with("---\ncompleted."));
    }

    #[test]
    fn wrapping_stack_config_is_rejected() {
        let img = LoadedImage::from_words(0x1000, &[0x6BFA_8001]);
        let config = CpuConfig {
            stack_start: u64::MAX - 0xFF,
            stack_size: 0x1000,
            ..CpuConfig::default()
        };
        assert_eq!(
            Machine::new(&img, config).err(),
            Some(LayoutError::StackWraps { start: u64::MAX - 0xFF, size: 0x1000 })
        );
    }
}
