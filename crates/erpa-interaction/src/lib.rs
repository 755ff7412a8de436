pub mod csrf;
pub mod form;
pub mod http_backend;

pub use http_backend::HttpBackend;
