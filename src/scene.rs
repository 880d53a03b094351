pub mod blocks;
pub mod context;
pub mod frame;
pub mod registry;
