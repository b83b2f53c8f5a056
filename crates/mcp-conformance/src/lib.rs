//! mcp-conformance library crate.
//!
//! Drives a stdio JSON-RPC tool server through the MCP handshake, runs a
//! declarative catalogue of tool calls against it, classifies each reply as
//! pass, failure or tolerated upstream failure, and reports a CI verdict.
//!
//! Layers, bottom up: [`framing`] and [`transport`] move lines, [`rpc`] turns
//! them into JSON-RPC exchanges, [`client`] enforces the handshake,
//! [`classify`] judges replies, and [`orchestrator`] runs a [`catalogue`]
//! into a [`report`].

pub mod catalogue;
pub mod classify;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod framing;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod rpc;
pub mod transport;

#[doc(inline)]
pub use transport::{MockReply, MockTransport, MockTransportHandle};
