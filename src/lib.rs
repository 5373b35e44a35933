pub mod config;
pub mod dashboard;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod layers;
pub mod process;

pub use error::{LoadError, LoadResult};
