#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod ics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub use error::{Result, TextcalError};
