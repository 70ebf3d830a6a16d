#![forbid(unsafe_code)]

pub mod greeting_get;
pub mod greeting_post;
pub mod version;
