//! Request handler module
//!
//! Dispatches requests to static files or native functions according to the
//! loaded deployment.

pub mod function;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use function::{FunctionHandler, FunctionRegistry, FunctionRequest};
pub use router::handle_request;
