mod object_store_adapter;

pub use object_store_adapter::ObjectStoreAdapter;
