use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use lattice_scaffold_gen::generator::Generator;

/// Generate lattice plugin scaffolding from binary template descriptor sets.
///
/// Reads one or more FileDescriptorSet files produced by the upstream schema
/// compiler and writes a single formatted Rust source file containing the
/// Type/Instance/InstanceParam scaffolding for every template.
#[derive(Parser)]
#[command(name = "lattice-scaffold-gen", version, about)]
struct Cli {
    /// Descriptor-set file to include, as `path` or `path=label`.
    ///
    /// The label only appears in diagnostics; it defaults to the file name.
    /// Repeat the flag once per descriptor set.
    #[arg(long = "descriptor", short = 'd', required = true)]
    descriptors: Vec<String>,

    /// Map a schema package to the Rust path exporting its types, as
    /// `package=rust::path`. Repeat once per package.
    #[arg(long = "import-map", short = 'm', value_parser = parse_import_map)]
    import_maps: Vec<(String, String)>,

    /// Output file; always overwritten. Its parent directory names the
    /// generated package.
    #[arg(long, short)]
    out: PathBuf,

    /// Suppress non-error output.
    #[arg(long, short)]
    quiet: bool,
}

fn parse_import_map(entry: &str) -> Result<(String, String), String> {
    match entry.split_once('=') {
        Some((package, path)) if !package.is_empty() && !path.is_empty() => {
            Ok((package.to_string(), path.to_string()))
        }
        _ => Err(format!("expected `package=rust::path`, got '{entry}'")),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> lattice_scaffold_gen::error::Result<()> {
    let mut descriptor_files = BTreeMap::new();
    for entry in &cli.descriptors {
        let (path, label) = match entry.split_once('=') {
            Some((path, label)) => (PathBuf::from(path), label.to_string()),
            None => {
                let path = PathBuf::from(entry);
                let label = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| entry.clone());
                (path, label)
            }
        };
        descriptor_files.insert(path, label);
    }

    let generator = Generator {
        out_file_path: cli.out.clone(),
        import_mapping: cli.import_maps.iter().cloned().collect(),
    };

    if !cli.quiet {
        eprintln!(
            "Generating scaffolding for {} descriptor sets",
            descriptor_files.len()
        );
    }

    let stats = generator.generate(&descriptor_files)?;

    if !cli.quiet {
        eprintln!(
            "Wrote {} ({} templates, {} imports, {} bytes)",
            cli.out.display(),
            stats.models_built,
            stats.imports_collected,
            stats.bytes_written
        );
    }

    Ok(())
}
