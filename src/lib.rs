#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod archive;
pub mod cache_map;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod loaded;
pub mod maintenance;
pub mod markup;
pub mod paths;
pub mod storage;

pub use config::{MirrorConfig, MirrorSettings};
pub use engine::{InternalizeOutcome, InternalizeStatus, Internalizer};
