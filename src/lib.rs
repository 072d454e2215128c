//! Inbox auto-responder: replies to unread mail that asks for a response.

pub mod config;
pub mod error;
pub mod gmail;
pub mod pipeline;
pub mod server;
