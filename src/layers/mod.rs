//! Layer Model Module
//!
//! Static simulation of the engine's mesh-layer stack:
//! - `LayerEffect`: the change a single filter declares
//! - `LayerStack`: the stack those effects are applied to, in append order

mod effect;
mod stack;

pub use effect::LayerEffect;
pub use stack::LayerStack;
