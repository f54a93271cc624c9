pub mod domain;
pub mod error;
pub mod forecast;
pub mod protocol;
