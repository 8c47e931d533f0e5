pub mod http_profile_backend;

pub use http_profile_backend::HttpProfileBackend;
