pub mod config;
pub mod markup;
pub mod snapshot;
