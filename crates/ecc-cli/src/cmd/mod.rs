pub mod merge;
pub mod restore;
pub mod setup;
