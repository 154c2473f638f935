pub mod cli;
pub mod config;
pub mod partition;
pub mod query;
pub mod runner;
pub mod script;
pub mod staging;
pub mod submit;
pub mod template;

#[cfg(test)]
mod runner_test;
#[cfg(test)]
mod staging_test;
