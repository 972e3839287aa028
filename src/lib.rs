//! Block Arena - authoritative server and movement simulation for a
//! multiplayer voxel arena brawler

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
