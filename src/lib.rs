pub mod config;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod pipeline;
pub mod query;
pub mod sheets;
pub mod sync;

#[cfg(test)]
mod test_server;
