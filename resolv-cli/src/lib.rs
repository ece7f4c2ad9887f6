//! Library target for the `resolv` package.
//!
//! The primary deliverable of this package is the `resolv` CLI binary
//! (`src/main.rs`). This library exists so `cargo test -p resolv --doc`
//! has a target to run against.

#[doc(hidden)]
pub use stream_resolver;
