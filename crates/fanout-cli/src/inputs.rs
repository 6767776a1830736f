use std::io::Read;
use std::path::{Path, PathBuf};

use fanout_spec::{ManifestSet, SpecError, parse_manifests};
use tracing::info;

/// Origin label used for standard input.
pub const STDIN_ORIGIN: &str = "<stdin>";

/// Read and dispatch every source. No paths (or `-`) means standard input.
pub fn read_sources(paths: &[PathBuf]) -> Result<ManifestSet, SpecError> {
    let mut manifests = ManifestSet::default();

    if paths.is_empty() {
        manifests.extend(read_stdin()?);
        return Ok(manifests);
    }

    for path in paths {
        if path == Path::new("-") {
            manifests.extend(read_stdin()?);
            continue;
        }
        let contents = std::fs::read_to_string(path)?;
        let origin = path.display().to_string();
        let parsed = parse_manifests(&contents, &origin)?;
        info!(
            source = %origin,
            specs = parsed.specs.len(),
            secrets = parsed.secrets.len(),
            skipped = parsed.skipped,
            "source loaded"
        );
        manifests.extend(parsed);
    }

    Ok(manifests)
}

fn read_stdin() -> Result<ManifestSet, SpecError> {
    let mut contents = String::new();
    std::io::stdin().read_to_string(&mut contents)?;
    parse_manifests(&contents, STDIN_ORIGIN)
}
