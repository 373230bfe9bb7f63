//! release/mod.rs
//! Packaging pipeline and its downstream counterpart.

pub mod clock;
pub mod config;
pub mod packager;
pub mod summary;
pub mod unpack;

pub use clock::*;
pub use config::*;
pub use packager::*;
pub use summary::*;
pub use unpack::*;
