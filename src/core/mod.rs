pub mod config;
pub mod error;
pub mod middleware;
pub mod shared;
pub mod urls;
