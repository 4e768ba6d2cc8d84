//! A small Rust client for the Resolwe dataflow API used by Genialis
//! bioinformatics servers.
//!
//! This crate implements the `resdk`-style flow:
//! authenticate, look up a sample by slug, download its files.
//!
//! ## Quick start
//! - Create a session with explicit credentials via [`Resolwe::connect`],
//!   or from environment variables / a `.resolwerc` file via
//!   [`Resolwe::from_env`].
//! - Look up a sample with [`Resolwe::sample`] and download its files.
//!
//! ```no_run
//! use anyhow::Result;
//! use resolwe::Resolwe;
//!
//! fn main() -> Result<()> {
//!     let res = Resolwe::connect("<USERNAME>", "<PASSWORD>", "https://app.genialis.com")?
//!         .with_verbose(true);
//!
//!     let sample = res.sample().get("human-example-chr22")?;
//!     sample.download(&res, None)?;
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod download;
mod error;
mod model;
mod query;
mod util;

pub use client::{ClientConfig, Resolwe};
pub use download::RemoteFile;
pub use error::ResolweError;
pub use model::Sample;
pub use query::SampleQuery;
