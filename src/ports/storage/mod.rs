mod storage_client;

pub use storage_client::{ClientConnector, StorageClient};
