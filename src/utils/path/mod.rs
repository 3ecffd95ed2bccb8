//! Path and URL utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`, `lexical_normalize`)
//! - [`route`]: URL <-> path mapping (`relative_url_path`, `resolve_url_path`)

pub mod fs;
pub mod route;

pub use fs::{lexical_normalize, normalize_path, resolve_path};
pub use route::{relative_url_path, resolve_url_path};
