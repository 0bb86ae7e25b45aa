//! RVT2 analyzer
//!
//! Client core for browsing RVT2 forensic cases stored in ElasticSearch: query
//! templates, search and metadata stores, the HTTP client, the message bus, the file
//! daemon client and configuration.
//!
//! Stores are plain structs driven through a [`state::Dispatcher`], which owns the
//! backend client and routes every failure to the [`state::MessageBus`].

pub mod client;
pub mod config;
pub mod files;
pub mod logging;
pub mod model;
pub mod query;
pub mod state;
pub mod view;

#[cfg(test)]
mod test_harness;
