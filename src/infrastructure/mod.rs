// Infrastructure layer
pub mod embed;
pub mod file_system;
pub mod processors;
pub mod shims;

pub use embed::*;
pub use file_system::*;
pub use processors::*;
pub use shims::*;
