//! Command/event orchestration over Redis pub/sub.
//!
//! Inbound command channels are decoded into typed [`commands::Command`]
//! values by the dispatcher, handed to the supervisor as independent tasks,
//! and every accepted command ends in exactly one terminal event on the
//! matching outbound channel (or a documented silent abort).

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod supervisor;
