//! Background tasks.

pub mod request_poller;
