//! Commit Order Property Tests.
//!
//! Random straight-line integer programs must retire in program order and
//! leave the same architectural state as a sequential interpreter, whatever
//! the ROB and station sizes.

use proptest::prelude::*;
use tomasim_core::core::pipeline::tracker::Stage;

use crate::common::TestContext;
use crate::common::harness::drain;
use crate::common::mocks::Recorder;

#[derive(Clone, Copy, Debug)]
enum Op {
    Add,
    Sub,
    Addi,
}

#[derive(Clone, Copy, Debug)]
struct Line {
    op: Op,
    rd: usize,
    rs: usize,
    rt: usize,
    imm: i64,
}

impl Line {
    fn text(&self) -> String {
        match self.op {
            Op::Add => format!("Add R{}, R{}, R{}", self.rd, self.rs, self.rt),
            Op::Sub => format!("Sub R{}, R{}, R{}", self.rd, self.rs, self.rt),
            Op::Addi => format!("Addi R{}, R{}, #{}", self.rd, self.rs, self.imm),
        }
    }

    fn apply(&self, regs: &mut [i64; 5]) {
        let value = match self.op {
            Op::Add => regs[self.rs].wrapping_add(regs[self.rt]),
            Op::Sub => regs[self.rs].wrapping_sub(regs[self.rt]),
            Op::Addi => regs[self.rs].wrapping_add(self.imm),
        };
        if self.rd != 0 {
            regs[self.rd] = value;
        }
    }
}

fn line() -> impl Strategy<Value = Line> {
    (
        prop_oneof![Just(Op::Add), Just(Op::Sub), Just(Op::Addi)],
        0..5usize,
        0..5usize,
        0..5usize,
        -8..8i64,
    )
        .prop_map(|(op, rd, rs, rt, imm)| Line {
            op,
            rd,
            rs,
            rt,
            imm,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn retires_in_program_order(
        lines in prop::collection::vec(line(), 1..12),
        rob in 2..6usize,
        stations in 1..3usize,
        latency in 1..4u64,
    ) {
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let mut cpu = TestContext::new()
            .configure(|c| {
                c.rob.entries = rob;
                c.units.int_adder.stations = stations;
                c.units.int_adder.latency = latency;
            })
            .program(&refs)
            .build_cpu(Recorder::default());
        let _ = drain(&mut cpu, 2_000);

        let mut expected = [0i64; 5];
        for l in &lines {
            l.apply(&mut expected);
        }
        for (idx, want) in expected.iter().enumerate() {
            let got = cpu.regs.gpr.read(idx) as i64;
            prop_assert_eq!(got, *want, "R{} mismatch", idx);
        }

        let tracker = cpu.into_tracker();
        let commits = tracker.pcs(Stage::Commit);
        let in_order: Vec<u64> = (0..lines.len() as u64).map(|i| i * 4).collect();
        prop_assert_eq!(commits, in_order);

        let cycles = tracker.cycles(Stage::Commit);
        prop_assert!(cycles.windows(2).all(|w| w[0] < w[1]), "at most one commit per cycle");
    }
}
