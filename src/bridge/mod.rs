//! The relay core.
//!
//! ## Module Structure
//!
//! - `formatter`: text rendered on the opposite platform
//! - `filter`: per-direction regex blocklists
//! - `outlet`: send seams and fire-and-forget delivery
//! - `router`: relay policy (`RelayRouter`)
//! - `runner`: the event loop feeding the router

pub mod filter;
pub mod formatter;
pub mod outlet;
pub mod router;
pub mod runner;

pub use filter::MessageFilter;
pub use router::RelayRouter;
pub use runner::{RelayInputs, RelayLoop};
