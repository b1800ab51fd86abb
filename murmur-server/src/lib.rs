// Library exports for murmur-server
// The admin CLI and the integration tests build on these modules

pub mod api;
pub mod config;
pub mod db;
pub mod identity;
pub mod state;
pub mod storage;
