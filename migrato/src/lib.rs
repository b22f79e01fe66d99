#![forbid(unsafe_code)]

mod cache;
mod catalog;
pub mod cli;
pub mod config;
mod error;
pub mod migration;
mod runner;
mod source;

pub use cache::*;
pub use catalog::*;
pub use config::{
    ConfigBuilder, MigrateConfig, APP_VERSION_STABLE, PAGE_SIZE, PROJECTS_COLLECTION,
    ROOT_PROJECT_ID,
};
pub use error::*;
pub use runner::*;
pub use source::*;

pub use migrato_store as store;
