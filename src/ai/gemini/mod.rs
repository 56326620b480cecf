pub mod client;
pub mod try_on;
pub mod types;

pub use client::GeminiHttpClient;
pub use try_on::GeminiTryOnClient;
