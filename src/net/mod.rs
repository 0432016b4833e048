pub mod resolver;

#[cfg(feature = "http")]
pub mod http;
