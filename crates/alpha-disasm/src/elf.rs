//! Minimal little-endian ELF64 reader: just enough to hand the core a
//! [`LoadedImage`].

use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use tracing::debug;

use alpha_rs::{LoadedImage, Segment, TextSegment};

pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
pub const EM_ALPHA: u16 = 41;
pub const EM_ALPHA_EXP: u16 = 0x9026;

pub const PT_LOAD: u32 = 1;
pub const SHT_NOBITS: u32 = 8;
pub const SHF_ALLOC: u64 = 0x2;

/// Largest in-memory size accepted for one segment or section.
pub const MAX_SEGMENT_SIZE: u64 = 1 << 30;

const EHDR_SIZE: usize = 64;
const PHDR_SIZE: usize = 56;
const SHDR_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElfHeader {
    pub e_type: u16,
    pub e_machine: u16,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    pub name: String,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
}

impl SectionHeader {
    pub fn is_alloc(&self) -> bool {
        self.sh_flags & SHF_ALLOC != 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Elf64 {
    pub header: ElfHeader,
    pub programs: Vec<ProgramHeader>,
    pub sections: Vec<SectionHeader>,
}

/// Bounds-checked little-endian field reader over the whole file.
struct Reader<'a>(&'a [u8]);

impl Reader<'_> {
    fn bytes<const N: usize>(&self, off: u64) -> Result<[u8; N]> {
        let start = usize::try_from(off).context("offset overflows usize")?;
        let end = start.checked_add(N).context("offset overflows usize")?;
        ensure!(end <= self.0.len(), "truncated file: need {end} bytes, have {}", self.0.len());
        let mut out = [0; N];
        out.copy_from_slice(&self.0[start..end]);
        Ok(out)
    }
    fn u16(&self, off: u64) -> Result<u16> {
        Ok(u16::from_le_bytes(self.bytes(off)?))
    }
    fn u32(&self, off: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.bytes(off)?))
    }
    fn u64(&self, off: u64) -> Result<u64> {
        Ok(u64::from_le_bytes(self.bytes(off)?))
    }
    fn range(&self, off: u64, len: u64) -> Result<&[u8]> {
        let start = usize::try_from(off)?;
        let end = start.checked_add(usize::try_from(len)?).context("range overflows usize")?;
        self.0
            .get(start..end)
            .with_context(|| format!("range {off:#x}+{len:#x} outside file"))
    }
}

impl Elf64 {
    pub fn parse(data: &[u8]) -> Result<Self> {
        ensure!(data.len() >= EHDR_SIZE, "file too short for an ELF64 header");
        ensure!(data[0..4] == ELF_MAGIC, "not an ELF file");
        ensure!(data[4] == 2, "not a 64-bit ELF (class {})", data[4]);
        ensure!(data[5] == 1, "not a little-endian ELF (data {})", data[5]);

        let r = Reader(data);
        let header = ElfHeader {
            e_type: r.u16(16)?,
            e_machine: r.u16(18)?,
            e_entry: r.u64(24)?,
            e_phoff: r.u64(32)?,
            e_shoff: r.u64(40)?,
            e_phentsize: r.u16(54)?,
            e_phnum: r.u16(56)?,
            e_shentsize: r.u16(58)?,
            e_shnum: r.u16(60)?,
            e_shstrndx: r.u16(62)?,
        };
        if header.e_machine != EM_ALPHA && header.e_machine != EM_ALPHA_EXP {
            bail!("unsupported machine {:#06x} (only Alpha is supported)", header.e_machine);
        }

        let mut programs = Vec::with_capacity(header.e_phnum as usize);
        if header.e_phoff != 0 {
            let size = (header.e_phentsize as u64).max(PHDR_SIZE as u64);
            for i in 0..header.e_phnum as u64 {
                let at = header.e_phoff + i * size;
                programs.push(ProgramHeader {
                    p_type: r.u32(at)?,
                    p_flags: r.u32(at + 4)?,
                    p_offset: r.u64(at + 8)?,
                    p_vaddr: r.u64(at + 16)?,
                    p_filesz: r.u64(at + 32)?,
                    p_memsz: r.u64(at + 40)?,
                });
            }
        }

        let mut sections = Vec::with_capacity(header.e_shnum as usize);
        if header.e_shoff != 0 {
            let size = (header.e_shentsize as u64).max(SHDR_SIZE as u64);
            let shdr = |i: u64| header.e_shoff + i * size;
            let strtab = if header.e_shstrndx != 0 {
                let at = shdr(header.e_shstrndx as u64);
                r.range(r.u64(at + 24)?, r.u64(at + 32)?)?
            } else {
                &[]
            };
            for i in 0..header.e_shnum as u64 {
                let at = shdr(i);
                let name_off = r.u32(at)? as usize;
                let name = strtab
                    .get(name_off..)
                    .map(|s| {
                        let len = s.iter().position(|b| *b == 0).unwrap_or(s.len());
                        String::from_utf8_lossy(&s[..len]).into_owned()
                    })
                    .unwrap_or_default();
                sections.push(SectionHeader {
                    name,
                    sh_type: r.u32(at + 4)?,
                    sh_flags: r.u64(at + 8)?,
                    sh_addr: r.u64(at + 16)?,
                    sh_offset: r.u64(at + 24)?,
                    sh_size: r.u64(at + 32)?,
                });
            }
        }

        Ok(Self { header, programs, sections })
    }

    pub fn text(&self) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.name == ".text")
    }

    /// Loadable bytes: `PT_LOAD` segments (zero-filled up to `p_memsz`), or
    /// allocated sections when the file has no program headers.
    pub fn segments(&self, data: &[u8]) -> Result<Vec<Segment>> {
        let r = Reader(data);
        let loads: Vec<_> = self.programs.iter().filter(|p| p.p_type == PT_LOAD).collect();
        if !loads.is_empty() {
            return loads
                .into_iter()
                .map(|p| {
                    let size = p.p_memsz.max(p.p_filesz);
                    ensure!(
                        size <= MAX_SEGMENT_SIZE,
                        "segment at {:#x} is {size:#x} bytes (limit {MAX_SEGMENT_SIZE:#x})",
                        p.p_vaddr
                    );
                    let mut bytes = r.range(p.p_offset, p.p_filesz)?.to_vec();
                    bytes.resize(size as usize, 0);
                    debug!(vaddr = format_args!("{:#x}", p.p_vaddr), size, "PT_LOAD segment");
                    Ok(Segment { vaddr: p.p_vaddr, bytes })
                })
                .collect();
        }
        self.sections
            .iter()
            .filter(|s| s.is_alloc() && s.sh_size > 0)
            .map(|s| {
                ensure!(
                    s.sh_size <= MAX_SEGMENT_SIZE,
                    "section {} is {:#x} bytes (limit {MAX_SEGMENT_SIZE:#x})",
                    s.name,
                    s.sh_size
                );
                debug!(name = %s.name, addr = format_args!("{:#x}", s.sh_addr), "alloc section");
                let bytes = if s.sh_type == SHT_NOBITS {
                    vec![0; s.sh_size as usize]
                } else {
                    r.range(s.sh_offset, s.sh_size)?.to_vec()
                };
                Ok(Segment { vaddr: s.sh_addr, bytes })
            })
            .collect()
    }

    pub fn to_image(&self, data: &[u8]) -> Result<LoadedImage> {
        let text = self.text().context("no .text section")?;
        let segments = self.segments(data)?;
        ensure!(!segments.is_empty(), "no loadable segments");
        Ok(LoadedImage {
            entry: self.header.e_entry,
            segments,
            text: TextSegment { vaddr: text.sh_addr, size: text.sh_size, file_offset: text.sh_offset },
        })
    }
}

/// Parses `data` as an Alpha ELF64 executable.
pub fn load_elf(data: &[u8]) -> Result<(Elf64, LoadedImage)> {
    let elf = Elf64::parse(data)?;
    let image = elf.to_image(data)?;
    Ok((elf, image))
}
