pub mod analyzers;
pub mod categories;
pub mod config;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod temporal;
