pub mod cones;
pub mod ir;
pub mod partition;
pub mod split;

pub use cones::{ConeLayout, NativeCone, SocOrder};
pub use ir::{csr_from_rows, ProblemIr, RowSense, VarType};
pub use partition::VariablePartition;
pub use split::{ConstraintSplit, RowBlock};
