pub mod calculator;
pub mod ci;
pub mod config;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod platform;

#[cfg(test)]
mod test_support;
