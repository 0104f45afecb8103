//! # ledgergate
//!
//! Client-side session, access-control, and notification core for the
//! bookkeeping web application.
//!
//! The crate owns the authenticated identity (persisted across restarts and
//! re-verified against the backend), the route guard that decides whether a
//! navigation may proceed, and the transient toast queue the guard uses to
//! explain refusals. The `ledgergate` binary drives these against a real
//! backend from the command line.

pub mod api;
pub mod audit;
pub mod config;
pub mod context;
pub mod identity;
pub mod router;
pub mod session;
pub mod storage;
pub mod theme;
pub mod toast;
