//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Dispatch Model
//! - Callers submit `Document`s; the dispatcher serializes them and hands the
//!   payload to a `Transport`
//! - Rate limits are expressed per fixed window (`RateSettings`)

mod blueprint;
mod document;
mod error;
mod transport;

pub use blueprint::*;
pub use document::*;
pub use error::*;
pub use transport::*;
