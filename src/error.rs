//! Error types for the lattice-scaffold-gen crate.

use std::path::PathBuf;

/// Errors that can occur while generating scaffolding source.
///
/// Every variant is terminal for the `generate` call that produced it;
/// nothing is retried internally and no partial output is left behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a descriptor-set file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The descriptor-set file does not decode as a `FileDescriptorSet`.
    #[error("failed to decode {path} as a FileDescriptorSet: {source}")]
    Parse {
        path: PathBuf,
        source: prost::DecodeError,
    },

    /// A descriptor set could not be turned into a template model.
    #[error("model error in '{label}': {message}")]
    Model { label: String, message: String },

    /// The scaffolding template failed to render.
    #[error("failed to render scaffolding template: {source}")]
    Render { source: tera::Error },

    /// The rendered buffer is not valid Rust source.
    ///
    /// `source_text` holds the complete unformatted buffer so the offending
    /// template output can be diagnosed without re-running the generator.
    #[error("generated source does not parse: {source}\n{source_text}")]
    Format {
        source: syn::Error,
        source_text: String,
    },

    /// Import regrouping of the formatted source failed.
    #[error("failed to fix imports in generated source: {0}")]
    ImportFix(String),

    /// Failed to write the generated file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
