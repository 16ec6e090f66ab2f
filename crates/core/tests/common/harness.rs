use tomasim_core::Simulator;
use tomasim_core::common::data::{from_float, from_int, to_float, to_int};
use tomasim_core::common::reg::ArchReg;
use tomasim_core::config::Config;
use tomasim_core::core::Cpu;
use tomasim_core::core::arch::RegisterFiles;
use tomasim_core::core::pipeline::tracker::Tracker;
use tomasim_core::isa::program::Program;
use tomasim_core::soc::memory::Memory;

/// Fluent builder for a machine: configuration, initial state and program.
pub struct TestContext {
    pub config: Config,
    regs: Vec<(ArchReg, u64)>,
    words: Vec<(u64, u64)>,
    program: Vec<String>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("tomasim_core=debug")
            .try_init();

        Self {
            config: Config::default(),
            regs: Vec::new(),
            words: Vec::new(),
            program: Vec::new(),
        }
    }

    /// Adjust the configuration in place.
    pub fn configure(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    /// Set an integer register, e.g. `int("R3", 8)`.
    pub fn int(mut self, reg: &str, value: i64) -> Self {
        self.regs.push((reg.parse().unwrap(), from_int(value)));
        self
    }

    /// Set a floating register, e.g. `fp("F2", 1.5)`.
    pub fn fp(mut self, reg: &str, value: f64) -> Self {
        self.regs.push((reg.parse().unwrap(), from_float(value)));
        self
    }

    /// Set a memory word.
    pub fn word(mut self, address: u64, value: i64) -> Self {
        self.words.push((address, from_int(value)));
        self
    }

    /// Set the program, one instruction per element.
    pub fn program(mut self, lines: &[&str]) -> Self {
        self.program = lines.iter().map(|s| (*s).to_string()).collect();
        self
    }

    fn parts(&self) -> (Program, RegisterFiles, Memory) {
        let program = Program::from_lines(&self.program, self.config.registers.count).unwrap();
        let mut regs = RegisterFiles::new(self.config.registers.count);
        for &(reg, value) in &self.regs {
            regs.write(reg, value);
        }
        let mut memory = Memory::new(self.config.memory.size_bytes, self.config.memory.word_bytes);
        for &(address, value) in &self.words {
            memory.write(address, value).unwrap();
        }
        (program, regs, memory)
    }

    /// Build a simulator with a timing table.
    pub fn build(self) -> Simulator {
        let (program, regs, memory) = self.parts();
        Simulator::new(&self.config, program, regs, memory).unwrap()
    }

    /// Build a bare CPU reporting to `tracker`.
    pub fn build_cpu<T: Tracker>(self, tracker: T) -> Cpu<T> {
        let (program, regs, memory) = self.parts();
        Cpu::with_tracker(&self.config, program, regs, memory, tracker)
    }

    /// Build and run to completion.
    pub fn run(self) -> Simulator {
        let mut sim = self.build();
        let _ = sim.run().unwrap();
        sim
    }
}

/// Integer register value after a run.
pub fn int_reg(sim: &Simulator, reg: &str) -> i64 {
    to_int(sim.cpu.regs.read(reg.parse().unwrap()))
}

/// Floating register value after a run.
pub fn fp_reg(sim: &Simulator, reg: &str) -> f64 {
    to_float(sim.cpu.regs.read(reg.parse().unwrap()))
}

/// Tick a CPU until it drains, with a safety bound.
pub fn drain<T: Tracker>(cpu: &mut Cpu<T>, bound: u64) -> u64 {
    while !cpu.is_finished() {
        assert!(cpu.cycle() < bound, "program did not drain in {bound} cycles");
        cpu.tick().unwrap();
    }
    cpu.cycle()
}
