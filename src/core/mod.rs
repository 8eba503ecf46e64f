//! Core data model shared by the decoder, encoder, and transport shell.

pub mod command;
pub mod position;
pub mod registry;
