//! Core type definitions used across the Astral workspace.

pub mod filter;

pub use filter::FileFilter;
