pub mod kv_keys;
pub mod plugin;
pub mod types;

pub use kv_keys::{is_qan_uuid_key, kv_key, kv_prefix, qan_uuid_key};
pub use types::*;
