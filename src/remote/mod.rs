//! Remote endpoints: the per-user note document, a reachability probe and
//! the school portal that produces timetable/exam data.

pub mod config;
pub mod http;
pub mod memory;

pub use config::HttpConfig;
pub use http::{HttpConnectivity, HttpDatasetSource, HttpDocumentStore};
pub use memory::{MemoryDocumentStore, StaticConnectivity, StaticDatasetSource};
