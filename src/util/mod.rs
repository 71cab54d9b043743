//! Shared utilities

pub mod cancel;
pub mod config;
pub mod context;
pub mod fs;

pub use cancel::CancellationToken;
pub use config::Config;
pub use context::GlobalContext;
