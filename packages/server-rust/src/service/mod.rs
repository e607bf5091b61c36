//! Composition of repository results into client-facing documents.

pub mod assembler;

pub use assembler::MapConfigurationAssembler;
