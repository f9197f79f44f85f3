//! Storeroom Admin library.
//!
//! This crate provides the admin panel functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - `SQLite` via sqlx for all persistent data
//! - tower-sessions for the per-client session (identity + flash slot)
//!
//! Every page handler follows the same shape: permission gate, resolve,
//! validate, one mutation, flash + redirect. The shared pieces live in
//! [`flow`], [`middleware::auth`] and [`db::records`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod flow;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
