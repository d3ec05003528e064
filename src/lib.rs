//! `glyphsvg` library crate root.
//!
//! Sets a line of text in a web font and returns it as an SVG document of glyph paths.
//! The binary only parses flags, installs a logger and calls [`server::serve`].
//!
//! Pipeline per request:
//! - [`resolve`] picks a font file from a [`catalog::CatalogProvider`]
//! - [`cache::FetchCache`] downloads it once and keeps it on disk
//! - [`render`] turns text plus font file into minified SVG
//!
//! [`service::TextToSvgService`] runs that pipeline; [`server`] exposes it over HTTP.
//!
//! The library never initializes logging; it only emits through the `log` facade.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod font;
pub mod render;
pub mod resolve;
pub mod server;
pub mod service;

pub use config::ServiceConfig;
pub use service::{ServiceError, TextRequest, TextToSvgService};
