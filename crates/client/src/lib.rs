// twodays-client library: the ephemeral presence core behind the `twodays` binary.

pub mod client;
pub mod compose;
pub mod config;
pub mod engine;
pub mod identity;
pub mod runtime;
pub mod session;
pub mod store;
pub mod view;
