pub mod ease;
pub mod phase;
