pub mod analyzers;
pub mod charts;
pub mod config;
pub mod error;
pub mod explore;
pub mod ingest;
pub mod output;
pub mod session;
pub mod table;
