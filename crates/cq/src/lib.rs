//! cq: catalog search request compiler.
//!
//! Compiles abstract catalog searches (free text, filters, facets, category rules) into the
//! engine's JSON request format, explains the query trees it builds, and normalizes engine
//! responses. Containers, field catalogs and relevance tuning come from `.cq.toml` files.

#![warn(missing_docs)]

pub mod cli;
