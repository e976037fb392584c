// src/lib.rs

//! Regional job counter for 462 visa eligible postcodes.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
