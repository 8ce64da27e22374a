pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod testing;

pub use client::CatalogClient;
pub use error::ClientError;
