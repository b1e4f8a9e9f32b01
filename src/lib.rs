// Kiln - multi-target browser extension bundler
// Library surface with clean separation of concerns

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;
