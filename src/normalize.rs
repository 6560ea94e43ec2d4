//! Import injection and output normalization.
//!
//! The rendered buffer passes three stages in order: placeholder
//! substitution, a formatting gate, and an import fixer. The gate is
//! mandatory: source that does not parse is reported with the full buffer
//! attached and never reaches the file writer. The import fixer runs in
//! format-only mode, so it regroups and deduplicates `use` declarations
//! without touching any other code.

use crate::error::{Error, Result};
use crate::render::IMPORT_PLACEHOLDER;

/// Grouping prefix for the host framework's own crates: imports starting
/// with it sort into the trailing "local" group.
pub const LOCAL_IMPORT_PREFIX: &str = "lattice";

/// Substitute the newline-joined import list for the placeholder token.
///
/// Only the first occurrence is replaced; rendering emits exactly one. A
/// leftover placeholder cannot slip through silently because the token is
/// not valid Rust and the formatting gate rejects it.
pub fn inject_imports(source: &str, imports: &[String]) -> String {
    source.replacen(IMPORT_PLACEHOLDER, &imports.join("\n"), 1)
}

/// The formatting gate: the buffer must parse as a Rust source file.
///
/// On success returns the pretty-printed form. On failure the error carries
/// the complete unformatted buffer so the offending template output can be
/// inspected without re-running the generator.
pub fn format_source(source: &str) -> Result<String> {
    let file = syn::parse_file(source).map_err(|e| Error::Format {
        source: e,
        source_text: source.to_string(),
    })?;
    Ok(prettyplease::unparse(&file))
}

/// Regroup the file's leading `use` block: std/core/alloc first, external
/// crates second, `local_prefix` crates last, sorted within each group and
/// deduplicated. Declarations inside modules are indented and therefore
/// never touched.
pub fn fix_imports(source: &str, local_prefix: &str) -> Result<String> {
    let lines: Vec<&str> = source.lines().collect();

    let Some(start) = lines.iter().position(|line| is_use_start(line)) else {
        return Ok(source.to_string());
    };

    // Consume the contiguous block of top-level use declarations, allowing
    // blank lines between them and multi-line declarations.
    let mut declarations = Vec::new();
    let mut i = start;
    let mut end = start;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        if !is_use_start(lines[i]) {
            break;
        }
        let mut declaration = String::new();
        loop {
            let part = lines[i].trim();
            if !declaration.is_empty() {
                declaration.push(' ');
            }
            declaration.push_str(part);
            i += 1;
            if part.ends_with(';') {
                break;
            }
            if i >= lines.len() {
                return Err(Error::ImportFix(
                    "unterminated use declaration in generated source".to_string(),
                ));
            }
        }
        declarations.push(declaration);
        end = i;
    }

    // std / external / local, in output order.
    let mut groups: [Vec<String>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for declaration in declarations {
        syn::parse_str::<syn::ItemUse>(&declaration).map_err(|e| {
            Error::ImportFix(format!("'{declaration}' is not a valid use declaration: {e}"))
        })?;
        let root = root_segment(import_path(&declaration));
        let group = if matches!(root, "std" | "core" | "alloc") {
            0
        } else if root == local_prefix {
            2
        } else {
            1
        };
        if !groups[group].contains(&declaration) {
            groups[group].push(declaration);
        }
    }
    for group in &mut groups {
        group.sort_by_key(|d| import_path(d).to_string());
    }

    let mut tail_start = end;
    while tail_start < lines.len() && lines[tail_start].trim().is_empty() {
        tail_start += 1;
    }

    let mut out: Vec<String> = lines[..start].iter().map(|s| s.to_string()).collect();
    let mut first_group = true;
    for group in &groups {
        if group.is_empty() {
            continue;
        }
        if !first_group {
            out.push(String::new());
        }
        out.extend(group.iter().cloned());
        first_group = false;
    }
    if tail_start < lines.len() {
        out.push(String::new());
        out.extend(lines[tail_start..].iter().map(|s| s.to_string()));
    }

    let mut result = out.join("\n");
    if source.ends_with('\n') && !result.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

/// Top-level use declarations only: anything indented belongs to a module
/// body and must stay where it is.
fn is_use_start(line: &str) -> bool {
    line.starts_with("use ") || line.starts_with("pub use ")
}

/// `pub use std::time::Duration;` → `std::time::Duration`
fn import_path(declaration: &str) -> &str {
    declaration
        .strip_prefix("pub use ")
        .or_else(|| declaration.strip_prefix("use "))
        .unwrap_or(declaration)
        .trim_end_matches(';')
}

fn root_segment(path: &str) -> &str {
    path.split("::").next().unwrap_or(path).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_replaces_one_placeholder_with_joined_imports() {
        let source = format!("head\n{IMPORT_PLACEHOLDER}\ntail\n");
        let imports = vec![
            "use std::time::Duration;".to_string(),
            "use lattice::telemetry;".to_string(),
        ];

        let injected = inject_imports(&source, &imports);
        assert_eq!(
            injected,
            "head\nuse std::time::Duration;\nuse lattice::telemetry;\ntail\n"
        );
    }

    #[test]
    fn inject_with_no_imports_blanks_the_placeholder() {
        let source = format!("head\n{IMPORT_PLACEHOLDER}\ntail\n");
        assert_eq!(inject_imports(&source, &[]), "head\n\ntail\n");
    }

    #[test]
    fn format_failure_carries_the_unformatted_buffer() {
        let bad = "pub struct Broken {".to_string();
        let err = format_source(&bad).unwrap_err();
        match err {
            Error::Format { source_text, .. } => assert_eq!(source_text, bad),
            other => panic!("expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn format_pretty_prints_valid_source() {
        let formatted = format_source("pub   struct   Foo { pub a : i64 }").unwrap();
        assert!(formatted.contains("pub struct Foo {"));
        assert!(formatted.contains("pub a: i64,"));
    }

    #[test]
    fn leftover_placeholder_fails_the_format_gate() {
        let err = format_source(&format!("{IMPORT_PLACEHOLDER}\npub struct Foo;\n")).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn fix_imports_groups_sorts_and_dedups() {
        let source = "\
//! Generated.
use lattice::telemetry;
use std::time::Duration;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
pub struct Foo;
";
        let fixed = fix_imports(source, LOCAL_IMPORT_PREFIX).unwrap();
        assert_eq!(
            fixed,
            "\
//! Generated.
use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use lattice::telemetry;

pub struct Foo;
"
        );
    }

    #[test]
    fn fix_imports_leaves_module_inner_uses_alone() {
        let source = "\
use std::time::Duration;
pub mod metric {
    use super::*;
    pub struct Type;
}
";
        let fixed = fix_imports(source, LOCAL_IMPORT_PREFIX).unwrap();
        assert!(fixed.contains("    use super::*;"));
        assert!(fixed.starts_with("use std::time::Duration;"));
    }

    #[test]
    fn fix_imports_without_use_block_is_identity() {
        let source = "pub struct Foo;\n";
        assert_eq!(fix_imports(source, LOCAL_IMPORT_PREFIX).unwrap(), source);
    }

    #[test]
    fn unterminated_use_is_an_import_fix_error() {
        let err = fix_imports("use std::time::Duration", LOCAL_IMPORT_PREFIX).unwrap_err();
        assert!(matches!(err, Error::ImportFix(_)), "got {err:?}");
    }

    #[test]
    fn invalid_use_declaration_is_an_import_fix_error() {
        let err = fix_imports("use std::!!;\n", LOCAL_IMPORT_PREFIX).unwrap_err();
        assert!(matches!(err, Error::ImportFix(_)), "got {err:?}");
    }
}
