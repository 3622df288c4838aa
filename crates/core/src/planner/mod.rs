//! Output path planning.
//!
//! Derives the destination path for a source file so that the output tree
//! mirrors the source tree: the path relative to the source root is re-rooted
//! at the output root. Convert jobs swap the extension for the target
//! format's; copy jobs keep the original name untouched.

use std::path::{Path, PathBuf};

/// Mirrors `input` under `output_root` and replaces its extension.
///
/// The file stem is preserved; a file without an extension gains one.
pub fn convert_output(
    input: &Path,
    source_root: &Path,
    output_root: &Path,
    extension: &str,
) -> PathBuf {
    mirrored(input, source_root, output_root).with_extension(extension)
}

/// Mirrors `input` under `output_root`, keeping the file name as-is.
pub fn copy_output(input: &Path, source_root: &Path, output_root: &Path) -> PathBuf {
    mirrored(input, source_root, output_root)
}

fn mirrored(input: &Path, source_root: &Path, output_root: &Path) -> PathBuf {
    let relative = match input.strip_prefix(source_root) {
        Ok(rel) => rel,
        // Input outside the scanned root: fall back to the bare file name.
        Err(_) => input.file_name().map(Path::new).unwrap_or(input),
    };
    output_root.join(relative)
}
