//! Pressnote - a small news feed with comments and a private notes application
//!
//! This library provides the core functionality for the Pressnote server.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod web;
