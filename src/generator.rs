//! Generation orchestration: load → model → render → normalize → write.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::descriptor::load_descriptor_set;
use crate::error::{Error, Result};
use crate::model;
use crate::normalize;
use crate::render::{self, BootstrapModel};

/// Statistics collected during generation for reporting.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub models_built: usize,
    pub imports_collected: usize,
    pub bytes_written: usize,
}

/// Configuration for one generated scaffolding file.
///
/// A value is built once per output file and consumed by a single
/// [`Generator::generate`] call; no state is retained across calls and the
/// output file is always overwritten, never appended.
#[derive(Clone, Debug)]
pub struct Generator {
    /// Output file; its parent directory names the generated package.
    pub out_file_path: PathBuf,

    /// Schema package name → Rust path exporting that package's types.
    /// Keys are unique by construction.
    pub import_mapping: BTreeMap<String, String>,
}

impl Generator {
    /// Generate the scaffolding file for the given descriptor sets.
    ///
    /// `descriptor_files` maps each descriptor path to a label used in
    /// diagnostics only. Paths are processed in lexicographic order, which
    /// fixes the model order and makes output byte-for-byte reproducible.
    /// The first failing stage aborts the call; the output file is written
    /// only after every stage has succeeded.
    ///
    /// Duplicate template names across descriptor sets are not detected
    /// here; the invoking build pipeline owns name hygiene.
    pub fn generate(&self, descriptor_files: &BTreeMap<PathBuf, String>) -> Result<GenerationStats> {
        let mut models = Vec::with_capacity(descriptor_files.len());
        for (path, label) in descriptor_files {
            let fds = load_descriptor_set(path)?;
            models.push(model::build_model(&fds, &self.import_mapping, label)?);
        }

        let bootstrap = BootstrapModel {
            pkg_name: parent_dir_name(&self.out_file_path),
            template_models: models,
        };
        let (source, imports) = render::render(render::DEFAULT_TEMPLATE, &bootstrap)?;

        let injected = normalize::inject_imports(&source, &imports);
        let formatted = normalize::format_source(&injected)?;
        let fixed = normalize::fix_imports(&formatted, normalize::LOCAL_IMPORT_PREFIX)?;

        let bytes = fixed.into_bytes();
        self.write_output(&bytes)?;

        Ok(GenerationStats {
            models_built: bootstrap.template_models.len(),
            imports_collected: imports.len(),
            bytes_written: bytes.len(),
        })
    }

    /// Create or truncate the output file and write the normalized bytes.
    /// A failed write deletes the partial file before returning.
    fn write_output(&self, bytes: &[u8]) -> Result<()> {
        let path = &self.out_file_path;
        let mut file = File::create(path).map_err(|e| Error::Write {
            path: path.clone(),
            source: e,
        })?;
        if let Err(e) = file.write_all(bytes) {
            drop(file);
            let _ = std::fs::remove_file(path);
            return Err(Error::Write {
                path: path.clone(),
                source: e,
            });
        }
        Ok(())
    }
}

/// Name of the directory containing `path`, used as the generated package
/// name.
fn parent_dir_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_name_takes_the_containing_directory() {
        assert_eq!(
            parent_dir_name(Path::new("src/generated/telemetry/scaffold.rs")),
            "telemetry"
        );
        assert_eq!(parent_dir_name(Path::new("scaffold.rs")), "");
    }
}
