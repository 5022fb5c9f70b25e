pub mod audit;
pub mod catalog;
pub mod config;
pub mod hasher;
pub mod ingest;
pub mod parser;
pub mod partition;
pub mod paths;
pub mod record;
pub mod sync;
pub mod tag_index;
pub mod util;
pub mod validate;
