//! Routing module
//!
//! Provides the ordered route matcher of the deployment manifest:
//! - Anchored regex route sources
//! - First-match-wins resolution
//! - Positional `$n` destination templates

mod matcher;
pub mod pattern;
pub mod template;

pub use matcher::{CompiledRoute, Resolution, RouteTable};
