use anyhow::{ensure, Context, Result};
use std::path::Path;
use tracing::info;

use alpha_rs::LoadedImage;

use crate::elf::{self, Elf64, ELF_MAGIC};

/// A file on disk together with the image the core runs from it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub bytes: Vec<u8>,
    pub elf: Option<Elf64>,
    pub image: LoadedImage,
}

/// Loads `path` as an ELF64 executable, or as a flat binary placed at `base`
/// when it lacks the ELF magic.
pub fn load(path: &Path, base: u64) -> Result<Loaded> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.starts_with(&ELF_MAGIC) {
        let (elf, image) = elf::load_elf(&bytes).with_context(|| format!("parsing {}", path.display()))?;
        info!(
            path = %path.display(),
            entry = format_args!("{:#x}", image.entry),
            segments = image.segments.len(),
            "loaded ELF64 image"
        );
        return Ok(Loaded { bytes, elf: Some(elf), image });
    }
    let image = load_raw_bin(&bytes, base, 0, None)?;
    info!(
        path = %path.display(),
        base = format_args!("{base:#x}"),
        len = bytes.len(),
        "loaded raw image"
    );
    Ok(Loaded { bytes, elf: None, image })
}

pub fn load_raw_bin(file: &[u8], base: u64, skip: usize, len: Option<usize>) -> Result<LoadedImage> {
    ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(LoadedImage::flat(base, payload.to_vec(), base))
}
