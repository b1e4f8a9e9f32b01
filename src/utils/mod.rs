// Shared utilities module
pub mod constants;
pub mod errors;
pub mod logging;
pub mod reporter;

pub use constants::*;
pub use errors::*;
pub use logging::*;
pub use reporter::*;
