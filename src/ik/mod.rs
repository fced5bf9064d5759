pub mod chain;
pub mod constraint;
pub mod pointer;
pub mod resolver;

pub use chain::{ChainRole, IkChain, IkJoint};
pub use constraint::{AxisLimit, JointConstraint};
pub use pointer::{to_ndc, ViewCamera};
pub use resolver::{resolve, ResolveReport, Resolver, DEFAULT_DAMPING};
