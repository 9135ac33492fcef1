#[macro_use]
extern crate failure;
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate url;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;

pub mod client;
pub mod config;
pub mod error;
pub mod fs;
pub mod local;
pub mod webhdfs;

pub use client::{HdfsClient, PathType};
