//! # mill-io: instance files and run reports
//!
//! Instance files are plain whitespace-separated integers:
//!
//! ```text
//! m n r
//! c[0][0] ... c[0][n-1]
//! ...
//! c[m-1][0] ... c[m-1][n-1]
//! b[0] ... b[n-1]
//! ```
//!
//! `m` facilities, `n` clients, one cost row per facility, then the client
//! budgets. The facilities are split between leader and follower at read time
//! (see [`ReadOptions`]); the third header value is not used by the reader.
//!
//! ```rust,no_run
//! use mill_io::{read_instance, ReadOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let instance = read_instance("data/CAP71.txt", &ReadOptions::default())?;
//!     println!("clients: {}", instance.clients_count());
//!     Ok(())
//! }
//! ```

pub mod reader;
pub mod report;

pub use reader::{parse_instance, read_instance, render_instance, write_instance, ReadOptions};
pub use report::{write_json, write_records, RunRecord};
