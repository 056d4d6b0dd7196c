pub mod config;
pub mod coordinates;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod levels;
pub mod output;
pub mod parser;
pub mod record;
pub mod rollup;
pub mod testdata;
