use serde::{Deserialize, Serialize};

/// Loadable bytes placed at `vaddr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub vaddr: u64,
    pub bytes: Vec<u8>,
}

impl Segment {
    pub fn end(&self) -> u64 {
        self.vaddr.wrapping_add(self.bytes.len() as u64)
    }

    pub fn contains(&self, addr: u64, len: u64) -> bool {
        addr >= self.vaddr && addr.checked_add(len).is_some_and(|e| e <= self.end())
    }
}

/// The executable section driving the listing and bounding the PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub vaddr: u64,
    pub size: u64,
    pub file_offset: u64,
}

impl TextSegment {
    pub fn end(&self) -> u64 {
        self.vaddr.wrapping_add(self.size)
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.vaddr && addr < self.end()
    }
}

/// What an object-file reader hands to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedImage {
    pub entry: u64,
    pub segments: Vec<Segment>,
    pub text: TextSegment,
}

impl LoadedImage {
    /// Single-segment image whose text covers all of `bytes`.
    pub fn flat(base: u64, bytes: Vec<u8>, entry: u64) -> Self {
        let text = TextSegment { vaddr: base, size: bytes.len() as u64, file_offset: 0 };
        Self { entry, segments: vec![Segment { vaddr: base, bytes }], text }
    }

    /// Builds a flat image from instruction words laid out from `base`.
    pub fn from_words(base: u64, words: &[u32]) -> Self {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self::flat(base, bytes, base)
    }

    /// Lowest and one-past-highest address covered by any segment.
    pub fn load_range(&self) -> Option<(u64, u64)> {
        let start = self.segments.iter().map(|s| s.vaddr).min()?;
        let end = self.segments.iter().map(Segment::end).max()?;
        Some((start, end))
    }

    pub fn read_u32(&self, addr: u64) -> Option<u32> {
        let s = self.segments.iter().find(|s| s.contains(addr, 4))?;
        let off = (addr - s.vaddr) as usize;
        Some(u32::from_le_bytes([s.bytes[off], s.bytes[off + 1], s.bytes[off + 2], s.bytes[off + 3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_reads_words() {
        let img = LoadedImage::from_words(0x1_2000_0000, &[0x47FF_041F, 0x6BFA_8001]);
        assert_eq!(img.read_u32(0x1_2000_0004), Some(0x6BFA_8001));
        assert_eq!(img.read_u32(0x1_2000_0006), None);
        assert_eq!(img.load_range(), Some((0x1_2000_0000, 0x1_2000_0008)));
        assert_eq!(img.text.size, 8);
    }
}
