pub mod bot;
pub mod config;
pub mod error;
pub mod platform;
pub mod translate;
pub mod webhook;
