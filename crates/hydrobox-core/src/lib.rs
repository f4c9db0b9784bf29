pub mod config;
pub mod encoding;
pub mod error;

pub use config::HydroboxConfig;
pub use encoding::Encoding;
pub use error::{HydroboxError, HydroboxResult};
