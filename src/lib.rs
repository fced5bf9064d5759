pub mod config;
pub mod error;
pub mod face;
pub mod filter;
pub mod ik;
pub mod rig;
pub mod synth;
pub mod vmc;
