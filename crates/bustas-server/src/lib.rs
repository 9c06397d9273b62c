pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rest;
