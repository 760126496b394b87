pub mod api;
pub mod config;
pub mod logging;
pub mod session;
pub mod state;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
