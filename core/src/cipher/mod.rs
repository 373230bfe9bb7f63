
pub mod types;
pub mod ecb;
pub mod keys;

pub use types::*;
pub use ecb::*;
pub use keys::*;
