pub mod block;
pub mod meta;
pub mod plan;
