//! On-disk state owned by the tracker.
//!
//! # Submodules
//!
//! - [`catalog`]: the JSON product catalog with per-product price histories
//! - [`registry`]: the line-oriented list of tracked URLs
//!
//! # Layout
//!
//! ```text
//! ./
//! ├── product_data.json   # whole-file rewrite on every tracked scrape
//! └── products.txt        # append-only, one URL per line
//! ```

pub mod catalog;
pub mod registry;
