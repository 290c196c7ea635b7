//! finz-requests - processes Finz sign-up and unsubscribe requests.
//!
//! Requests arrive as rows of a "Requests" sheet. Each pending row is resolved
//! against the user "Database" sheet, which is updated in place, and the
//! requester receives a confirmation email. New users get a personal
//! spreadsheet copied from a template.

pub mod backend;
pub mod config;
pub mod error;
pub mod google;
pub mod logging;
pub mod model;
pub mod repository;
pub mod service;
pub mod task;
