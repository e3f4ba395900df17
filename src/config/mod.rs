pub mod settings;

pub use settings::{DatabaseConfig, FilerConfig, StorageConfig};
