//! Top-level facade crate for allowsites.
//!
//! Re-exports the policy core and the host library so users can depend on a single crate.

pub mod core {
    pub use allowsites_core::*;
}

pub mod host {
    pub use allowsites_host::*;
}
