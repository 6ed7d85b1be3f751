//! Bookshelf application library
//!
//! The catalog modules and their helpers, mounted by the `bookshelf-app` binary.

pub mod modules;
pub mod utils;

pub use modules::register_all;
