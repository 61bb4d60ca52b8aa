pub mod assemble;
pub mod energy;
pub mod replay;
pub mod segments;
