pub mod browser;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod storage;
pub mod sync;
