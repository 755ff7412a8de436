pub mod paths;
pub mod storage;

pub use paths::{ErpaPaths, PathError};
pub use storage::ConfigStorage;
