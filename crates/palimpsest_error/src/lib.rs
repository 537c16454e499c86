//! Error types for the Palimpsest narrative graph store.
//!
//! Every error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind with the source location that raised it
//! - constructors use `#[track_caller]` so locations are captured automatically
//!
//! # Examples
//!
//! ```
//! use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
//!
//! fn load_branch() -> PalimpsestResult<String> {
//!     Err(StoreError::new(StoreErrorKind::NotFound("branch main".to_string())))?
//! }
//!
//! match load_branch() {
//!     Ok(branch) => println!("Loaded {}", branch),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "database")]
mod database;
mod error;
mod graph;
mod store;

pub use config::{ConfigError, ConfigErrorKind};
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{PalimpsestError, PalimpsestErrorKind, PalimpsestResult};
pub use graph::{GraphError, GraphErrorKind};
pub use store::{StoreError, StoreErrorKind};
