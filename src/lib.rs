pub mod graph_utils;
pub mod ingest;
pub mod navigation;
pub mod persistence;
