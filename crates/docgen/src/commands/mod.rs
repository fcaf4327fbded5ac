//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod compile_examples;
pub(crate) mod manifest;

pub(crate) use build::BuildArgs;
pub(crate) use compile_examples::CompileExamplesArgs;
pub(crate) use manifest::ManifestArgs;
