pub mod config;
pub mod credentials;
pub mod error;
pub mod fragment;
pub mod io;
pub mod json_path;
pub mod merge;
pub mod paths;
pub mod placeholder;
pub mod preflight;
pub mod preserve;
pub mod setup;

pub use error::{EccError, Result};
pub use merge::{deep_merge, ConfigMerger, MergeOutcome};
