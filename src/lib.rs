//! lockstate checks C-style test fixtures for lock-lifecycle misuse.
//!
//! The pipeline is small: [`fixture`] parses a fixture into a [`trace`]
//! of lock events and an [`expect`] oracle built from its annotation
//! comments, [`detect`] runs the double-initialization rule over the
//! trace, and [`report`] carries the findings. [`config`] decides which
//! callee names count as init/destroy, and [`watch`] re-runs the whole
//! pipeline whenever a watched fixture changes.

#![warn(non_snake_case)]

pub mod config;
pub mod detect;
pub mod expect;
pub mod fixture;
pub mod options;
pub mod report;
pub mod trace;
pub mod watch;
