// zim-aio/src/lib.rs
//! Filesystem, JSON and process primitives shared by the zim engines.

pub mod fs;
pub mod json_io;
pub mod process;

pub use json_io::{read_json, write_json};
pub use process::spawn_detached;
