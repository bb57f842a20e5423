//! Lyrics text from song pages
//!
//! This module provides:
//! - an HTML extractor for the current and legacy page layouts
//! - a page fetcher with bounded retry and optional scraping proxy

pub mod extract;
pub mod fetch;

pub use extract::{extract, extract_with_layout};
pub use fetch::{PageFetcher, PageSource};
