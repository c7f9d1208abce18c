//! WDS block server library.
//!
//! Attribute schemas, block registration and server-side rendering for the
//! `wds/recent-posts` block, plus the HTTP routes that expose them. The main
//! entry point for running the server is the `wds-blocks` binary.

pub mod block;
pub mod cli;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod html;
pub mod locale;
pub mod routes;
pub mod state;
