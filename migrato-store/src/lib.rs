#![forbid(unsafe_code)]

mod authorization;
mod document;
mod engine;
mod error;
mod pool;
mod provider;

pub use authorization::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use migrato_query::{Page, PageArgs};
pub use pool::*;
pub use provider::*;
