//! The protocol core of heron, a minimal SMTP-speaking server.
//!
//! [smtp] holds the sans-IO half: reply codes, command parsing, the
//! per-connection [smtp::Session] and the [smtp::Server] state machine that
//! turns command lines into replies. [net] owns the sockets: it frames lines
//! on a byte stream and supervises one task per accepted connection.

pub mod config;
pub mod net;
pub mod smtp;
