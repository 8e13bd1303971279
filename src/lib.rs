// src/lib.rs
//! Annual financial statements from the Hungarian e-beszámoló portal.
pub mod config;
pub mod export;
pub mod extractors;
pub mod portal;
pub mod utils;
