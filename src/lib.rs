pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod map;
pub mod system;
pub mod viz;
