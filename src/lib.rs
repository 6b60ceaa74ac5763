pub mod codec;
pub mod commands;
pub mod error;
pub mod fs_utils;
pub mod paths;
pub mod profile;
pub mod sources;
pub mod store;
pub mod ui;

pub use error::{ErrorKind, ProfileError};
pub use profile::ProfileRecord;
pub use store::ProfileStore;

#[cfg(test)]
pub mod test_utils;
