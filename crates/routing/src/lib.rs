pub mod client;
pub mod config;
pub mod error;
pub mod planner;
pub mod request;
pub mod response;

pub use client::*;
pub use config::*;
pub use error::*;
pub use planner::*;
pub use request::*;
pub use response::*;
