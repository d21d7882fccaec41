mod compose;
mod error;
pub mod footer;
mod model;
mod package;
mod rels;
mod render;
mod signature_image;
mod xml;

pub use compose::{Composition, TABLE_ROWS, compose};
pub use error::{Error, SignError};
pub use model::{
    Alignment, DATE_FORMAT, DateKind, Fallback, ImageSize, InsertionOutcome, Labels, Layout,
    SignOptions, SignatureBlock, SignatureSlot, TIMESTAMP_FORMAT, TextStyle,
};
pub use package::Package;

use std::path::{Path, PathBuf};

pub struct SignRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub slots: Vec<SignatureSlot>,
}

#[derive(Debug)]
pub struct SignReport {
    pub output: PathBuf,
    pub size_bytes: u64,
    pub composition: Composition,
}

/// Replace the first section's footer of an in-memory package with a signature block.
pub fn sign_package(
    package: &mut Package,
    slots: &[SignatureSlot],
    options: &SignOptions,
) -> Result<Composition, Error> {
    let mut region = footer::reset(package)?;
    let composition = compose(&mut region, slots, options)?;
    region.finish()?;
    Ok(composition)
}

/// Sign `request.input` and write the result to `request.output`. The input
/// file is only read; the output's parent directory is created if needed.
pub fn sign_document(request: &SignRequest, options: &SignOptions) -> Result<SignReport, SignError> {
    let input = &request.input;
    if !input.is_file() {
        return Err(SignError::Precondition(input.clone()));
    }
    log::info!("signing {} -> {}", input.display(), request.output.display());

    let mut package = Package::open(input)?;
    let composition = sign_package(&mut package, &request.slots, options)?;
    for fallback in &composition.fallbacks {
        log::debug!("fallback: {fallback}");
    }

    let size_bytes = persist(&package, &request.output)?;
    log::info!("saved {} ({size_bytes} bytes)", request.output.display());
    Ok(SignReport { output: request.output.clone(), size_bytes, composition })
}

fn persist(package: &Package, output: &Path) -> Result<u64, SignError> {
    let failed = |reason: String| SignError::Persistence { path: output.to_path_buf(), reason };

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| failed(format!("creating {}: {e}", dir.display())))?;
    }
    package.save(output).map_err(|e| failed(e.to_string()))?;

    match std::fs::metadata(output) {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(failed("output is not a regular file".into())),
        Err(e) => Err(failed(format!("output missing after save: {e}"))),
    }
}
