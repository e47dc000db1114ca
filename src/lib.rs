//! Terminal dataset viewer: pick a dataset from a catalog, infer a semantic
//! type per column, show summary statistics and histograms, and browse the
//! rows in a sortable, vertically-virtualized grid.
//!
//! The analysis engine (`infer`, `stats`, `sort`, `histogram`, `window`,
//! `throttle`) is independent of the terminal front end; `model` wires it to
//! the `controller`/`ui` glue.

pub mod catalog;
pub mod controller;
pub mod domain;
pub mod histogram;
pub mod infer;
pub mod loader;
pub mod model;
pub mod sort;
pub mod stats;
pub mod throttle;
pub mod ui;
pub mod window;
