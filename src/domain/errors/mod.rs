mod storage_errors;

pub use storage_errors::*;
