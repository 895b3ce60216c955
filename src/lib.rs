//! Web front-end for a remote translation service.
//!
//! Requests go through a cache-aside [`pipeline`]: a Redis-backed result cache
//! is consulted first and the remote backend is only called on a miss. The
//! HTTP [`server`] and its readiness waiter run under a [`runner`] that shuts
//! everything down together when one part fails or a signal arrives.

pub mod app;
pub mod cache;
pub mod config;
pub mod i18n;
pub mod logging;
pub mod pipeline;
pub mod readiness;
pub mod retry;
pub mod runner;
pub mod server;
pub mod signals;
pub mod translation;
pub mod web;

#[cfg(test)]
mod test_support;
