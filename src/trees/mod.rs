//! # Trees Module
//!
//! This module handles all family-tree functionality including:
//! - Listing a user's trees with person counts
//! - Loading a tree as a graph of nodes and edges
//! - Saving a tree (full replace of persons and relationships)

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use routes::trees_routes;
