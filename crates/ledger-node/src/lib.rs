pub mod api;
pub mod config;
pub mod p2p;
