//! Top-level facade crate for Figures.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use figures_core::*;
}

pub mod gateway {
    pub use figures_gateway::*;
}
