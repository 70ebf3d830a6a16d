#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod forward;
pub mod greeting;
pub mod web_utils;

#[cfg(test)]
pub mod test_support;
