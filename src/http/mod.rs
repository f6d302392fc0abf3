//! HTTP protocol layer module
//!
//! Protocol helpers shared by static serving and functions: caching,
//! content types, byte ranges and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use response::{HttpResponse, SendFile};
