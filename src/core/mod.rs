// Core domain layer
pub mod config;
pub mod graph;
pub mod interfaces;
pub mod models;
pub mod services;
pub mod targets;

pub use config::*;
pub use graph::*;
pub use interfaces::*;
pub use models::*;
pub use services::*;
pub use targets::*;
