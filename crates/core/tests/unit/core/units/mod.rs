/// Integer adder and floating-point datapaths.
pub mod alu;
