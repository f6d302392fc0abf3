//! Deploy router
//!
//! Serves a project described by a `vercel.json` manifest: requests are
//! matched against the manifest routes, then answered from the static build
//! or by a native handler registered for a Python function build.

pub mod config;
pub mod deployment;
pub mod downloader;
pub mod handler;
pub mod http;
pub mod logger;
pub mod manifest;
pub mod routing;
pub mod server;
