//! # jsonkv
//!
//! A single-file, human-readable key-value store.
//!
//! The whole store lives in one JSON document. Every mutation rewrites the
//! document before returning, and reads are served from memory. Besides plain
//! get/set it offers array, object and arithmetic operations on stored values,
//! plus backup and restore to a second file.
//!
//! ```no_run
//! use jsonkv::{JsonKv, Value};
//!
//! # fn main() -> jsonkv::Result<()> {
//! let mut kv = JsonKv::open("settings.json")?;
//! kv.set("visits", 1)?;
//! kv.add("visits", 1.0)?;
//! kv.push("recent", "index.html")?;
//!
//! assert_eq!(kv.fetch("visits"), Some(&Value::Number(2.0)));
//! assert_eq!(kv.array_fetch("recent", 0)?, Some(&Value::from("index.html")));
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod store;
pub mod value;

pub use error::{JsonKvError, Result};
pub use store::{DEFAULT_PATH, JsonKv, Operation};
pub use value::{MAX_DEPTH, Object, Value};
