pub mod backend;
pub mod blob;
pub mod config;
pub mod convert;
pub mod error;
pub mod host;
pub mod library;
pub mod logging;
pub mod perf;
pub mod source;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;
