//! Textlens - client for a Chinese text analysis service
//!
//! Sends texts to the analysis service, keeps the latest results of one
//! session, renders them for the terminal, assembles comprehensive reports
//! and downloads charts and data as files.

pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod models;
pub mod render;
pub mod report;
pub mod session;

pub use error::{Result, TextlensError};
