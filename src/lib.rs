//! Generate lattice plugin scaffolding from binary template descriptor sets.
//!
//! `lattice-scaffold-gen` reads `FileDescriptorSet` files produced by the
//! upstream schema compiler and emits a single formatted Rust source file
//! that wires every template's scaffolding into the lattice policy/telemetry
//! framework: Type/Instance/InstanceParam structs, `Build*` functions, and
//! the imports they need.
//!
//! # Features
//!
//! - One Type/Instance/InstanceParam triple and one builder per template message
//! - Imports accumulated from the types the template actually renders, then
//!   grouped, sorted, and deduplicated
//! - Mandatory format gate: output that does not parse fails the run and is
//!   never written
//! - Deterministic output: descriptor sets are processed in lexicographic
//!   path order, byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//!
//! use lattice_scaffold_gen::generator::Generator;
//!
//! let generator = Generator {
//!     out_file_path: PathBuf::from("src/generated/telemetry/scaffold.rs"),
//!     import_mapping: BTreeMap::from([(
//!         "lattice.telemetry".to_string(),
//!         "lattice::telemetry".to_string(),
//!     )]),
//! };
//! let files = BTreeMap::from([(PathBuf::from("metric.tds"), "metric".to_string())]);
//! let stats = generator.generate(&files)?;
//! eprintln!(
//!     "wrote {} bytes for {} templates",
//!     stats.bytes_written, stats.models_built
//! );
//! # Ok::<(), lattice_scaffold_gen::error::Error>(())
//! ```

pub mod descriptor;
pub mod error;
pub mod generator;
pub mod model;
pub mod normalize;
pub mod render;
pub mod type_map;
