pub mod compute;
pub mod descriptor;
pub mod registry;
pub mod token;

pub use compute::{ComputeRule, SkipRule};
pub use descriptor::{CountSpec, DenormDescriptor, DenormKind};
