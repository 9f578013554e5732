pub mod list;
pub mod pipeline;
