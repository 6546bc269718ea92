pub mod config;
pub mod error;
pub mod field;
pub mod record;

pub use config::EngineConfig;
pub use error::*;
pub use field::*;
pub use record::*;
