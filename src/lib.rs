//! Sales caller: capture a customer, write them a sales script with an LLM,
//! place the call through a voice agent and follow its transcript.

pub mod api;
pub mod calls;
pub mod config;
pub mod customer;
pub mod error;
pub mod llm;
pub mod store;
pub mod workflow;
