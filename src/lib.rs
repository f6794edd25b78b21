#[macro_use]
extern crate log;
#[macro_use]
extern crate nom;

pub mod app;
pub mod command;
pub mod config;
pub mod discovery;
mod error;
pub mod host;
pub mod operation;
pub mod plugin;
pub mod youtube;

pub use self::error::Error;
