// Processors module
pub mod asset_processor;
pub mod chunk_splitter;
pub mod optimizer;
pub mod pipeline;
pub mod script_processor;
pub mod stylesheet_processor;

pub use asset_processor::*;
pub use chunk_splitter::*;
pub use optimizer::*;
pub use pipeline::*;
pub use script_processor::*;
pub use stylesheet_processor::*;
