pub mod in_memory_store;
pub mod ndjson_store;
