// Manifest types module
// Wire format of the deployment manifest (vercel.json)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment manifest: build declarations plus ordered route declarations
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Manifest {
    /// Platform schema version
    pub version: u32,
    #[serde(default)]
    pub builds: Vec<BuildEntry>,
    /// Evaluated top to bottom, first match wins
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// How a source is turned into a deployable artifact
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BuildEntry {
    /// Glob selecting source files, relative to the project root
    pub src: String,
    /// Builder plugin identifier, e.g. `@vercel/python`
    #[serde(rename = "use")]
    pub builder: String,
}

/// Maps a request path pattern to a destination
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteEntry {
    /// Path regular expression, anchored at both ends when compiled
    pub src: String,
    /// Literal path or `$n` capture template
    pub dest: String,
}

/// Builders this server knows how to host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    /// Serverless function, served by a registered native handler
    Python,
    /// Static files served from the project tree
    Static,
}

impl BuilderKind {
    pub const PYTHON_ID: &'static str = "@vercel/python";
    pub const STATIC_ID: &'static str = "@vercel/static";

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            Self::PYTHON_ID => Some(Self::Python),
            Self::STATIC_ID => Some(Self::Static),
            _ => None,
        }
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Python => Self::PYTHON_ID,
            Self::Static => Self::STATIC_ID,
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl BuildEntry {
    pub fn kind(&self) -> Option<BuilderKind> {
        BuilderKind::from_id(&self.builder)
    }
}
