//! Descriptor-set loading.
//!
//! Template descriptor sets arrive as binary `FileDescriptorSet` messages
//! produced by the upstream schema compiler. Loading is all-or-nothing: an
//! unreadable path or malformed bytes abort the whole generation call, there
//! are no partial results.

use std::path::Path;

use prost::Message;
use prost_types::FileDescriptorSet;

use crate::error::{Error, Result};

/// Read and decode one descriptor-set file.
pub fn load_descriptor_set(path: &Path) -> Result<FileDescriptorSet> {
    let bytes = std::fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    FileDescriptorSet::decode(bytes.as_slice()).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, FileDescriptorProto};

    fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "lattice-scaffold-gen-descriptor-{}-{name}",
            std::process::id()
        ));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn load_round_trips_an_encoded_set() {
        let fds = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("metric.proto".to_string()),
                package: Some("lattice.templates.metric".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("Template".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        let path = write_temp("roundtrip.tds", &fds.encode_to_vec());

        let loaded = load_descriptor_set(&path).unwrap();
        assert_eq!(loaded, fds);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_bytes_are_a_parse_error() {
        let path = write_temp("garbage.tds", &[0xff, 0xff, 0xff, 0xff]);

        let err = load_descriptor_set(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "got {err:?}");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = std::env::temp_dir().join("lattice-scaffold-gen-does-not-exist.tds");
        let err = load_descriptor_set(&path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }), "got {err:?}");
    }
}
