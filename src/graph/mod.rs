//! Render-path signal graph for the output bus.
//!
//! Graph nodes wrap the low-level DSP primitives with block-based rendering
//! and snapshot parameters. The `bus` module wires them into the instrument's
//! fixed topology.

/// Master bus, dry/wet split and stereo output.
pub mod bus;
/// Soft-clip stage of the wet path.
pub mod distortion;
/// Core traits shared by all graph nodes.
pub mod node;
/// Stereo reverb stage of the wet path.
pub mod reverb;

pub use node::{GraphNode, Parameterized, RenderCtx};
