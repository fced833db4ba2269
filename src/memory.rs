use crate::image::LoadedImage;

/// Access outside both regions, or straddling a region boundary.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid address {addr:#018x} ({size}-byte access)")]
pub struct AddressError {
    pub addr: u64,
    pub size: u64,
}

pub type Result<T> = std::result::Result<T, AddressError>;

/// Largest image span (lowest to highest segment byte) mapped as one region.
pub const MAX_IMAGE_SPAN: u64 = 1 << 30;
/// Largest stack a configuration may ask for.
pub const MAX_STACK_SIZE: u64 = 1 << 30;

/// Region layout that cannot be backed by host memory.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("image spans {span:#x} bytes (limit {MAX_IMAGE_SPAN:#x})")]
    ImageTooLarge { span: u64 },
    #[error("stack of {size:#x} bytes exceeds limit {MAX_STACK_SIZE:#x}")]
    StackTooLarge { size: u64 },
    #[error("stack {start:#x}+{size:#x} wraps the address space")]
    StackWraps { start: u64, size: u64 },
}

pub trait Bus {
    fn read_u8(&mut self, addr: u64) -> Result<u8>;
    fn read_u16(&mut self, addr: u64) -> Result<u16>;
    fn read_u32(&mut self, addr: u64) -> Result<u32>;
    fn read_u64(&mut self, addr: u64) -> Result<u64>;
    fn write_u8(&mut self, addr: u64, val: u8) -> Result<()>;
    fn write_u16(&mut self, addr: u64, val: u16) -> Result<()>;
    fn write_u32(&mut self, addr: u64, val: u32) -> Result<()>;
    fn write_u64(&mut self, addr: u64, val: u64) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Image,
    Stack,
}

/// Everything a run can touch: the loaded image, a zero-filled stack and a
/// console port that swallows single-byte stores.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    image_base: u64,
    image: Vec<u8>,
    stack_base: u64,
    stack: Vec<u8>,
    console_addr: u64,
    output: String,
}

impl AddressSpace {
    pub fn new(
        image: &LoadedImage,
        stack_base: u64,
        stack_size: u64,
        console_addr: u64,
    ) -> std::result::Result<Self, LayoutError> {
        if stack_size > MAX_STACK_SIZE {
            return Err(LayoutError::StackTooLarge { size: stack_size });
        }
        if stack_base.checked_add(stack_size).is_none() {
            return Err(LayoutError::StackWraps { start: stack_base, size: stack_size });
        }
        let (start, end) = image.load_range().unwrap_or((0, 0));
        let span = end.saturating_sub(start);
        let wraps = image
            .segments
            .iter()
            .any(|s| s.vaddr.checked_add(s.bytes.len() as u64).is_none());
        if wraps || span > MAX_IMAGE_SPAN {
            return Err(LayoutError::ImageTooLarge { span });
        }

        let mut mem = vec![0; span as usize];
        for seg in &image.segments {
            let off = (seg.vaddr - start) as usize;
            mem[off..off + seg.bytes.len()].copy_from_slice(&seg.bytes);
        }
        Ok(Self {
            image_base: start,
            image: mem,
            stack_base,
            stack: vec![0; stack_size as usize],
            console_addr,
            output: String::new(),
        })
    }

    pub fn image_range(&self) -> (u64, u64) {
        (self.image_base, self.image_base + self.image.len() as u64)
    }

    pub fn stack_range(&self) -> (u64, u64) {
        (self.stack_base, self.stack_base + self.stack.len() as u64)
    }

    /// Zeroes the stack and drops any console output.
    pub fn reset(&mut self) {
        self.stack.fill(0);
        self.output.clear();
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn locate(&self, addr: u64, size: u64) -> Result<(Region, usize)> {
        let fits = |base: u64, len: usize| {
            addr >= base && addr.checked_add(size).is_some_and(|e| e <= base + len as u64)
        };
        if fits(self.image_base, self.image.len()) {
            Ok((Region::Image, (addr - self.image_base) as usize))
        } else if fits(self.stack_base, self.stack.len()) {
            Ok((Region::Stack, (addr - self.stack_base) as usize))
        } else {
            Err(AddressError { addr, size })
        }
    }

    fn slice<const N: usize>(&self, addr: u64) -> Result<[u8; N]> {
        let (region, off) = self.locate(addr, N as u64)?;
        let buf = match region {
            Region::Image => &self.image,
            Region::Stack => &self.stack,
        };
        let mut out = [0; N];
        out.copy_from_slice(&buf[off..off + N]);
        Ok(out)
    }

    fn store(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
        let (region, off) = self.locate(addr, bytes.len() as u64)?;
        let buf = match region {
            Region::Image => &mut self.image,
            Region::Stack => &mut self.stack,
        };
        buf[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl Bus for AddressSpace {
    fn read_u8(&mut self, addr: u64) -> Result<u8> {
        Ok(self.slice::<1>(addr)?[0])
    }
    fn read_u16(&mut self, addr: u64) -> Result<u16> {
        Ok(u16::from_le_bytes(self.slice(addr)?))
    }
    fn read_u32(&mut self, addr: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.slice(addr)?))
    }
    fn read_u64(&mut self, addr: u64) -> Result<u64> {
        Ok(u64::from_le_bytes(self.slice(addr)?))
    }
    fn write_u8(&mut self, addr: u64, val: u8) -> Result<()> {
        if addr == self.console_addr {
            self.output.push(val as char);
            return Ok(());
        }
        self.store(addr, &[val])
    }
    fn write_u16(&mut self, addr: u64, val: u16) -> Result<()> {
        self.store(addr, &val.to_le_bytes())
    }
    fn write_u32(&mut self, addr: u64, val: u32) -> Result<()> {
        self.store(addr, &val.to_le_bytes())
    }
    fn write_u64(&mut self, addr: u64, val: u64) -> Result<()> {
        self.store(addr, &val.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STACK: u64 = 0x00F0_0000;

    fn space() -> AddressSpace {
        let img = LoadedImage::flat(0x1000, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88], 0x1000);
        AddressSpace::new(&img, STACK, 64, 0x1000_0000).unwrap()
    }

    #[test]
    fn little_endian_reads() {
        let mut m = space();
        assert_eq!(m.read_u16(0x1000).unwrap(), 0x2211);
        assert_eq!(m.read_u32(0x1004).unwrap(), 0x8877_6655);
        assert_eq!(m.read_u64(0x1000).unwrap(), 0x8877_6655_4433_2211);
    }

    #[test]
    fn last_stack_byte_is_addressable() {
        let mut m = space();
        m.write_u8(STACK + 63, 0xAB).unwrap();
        assert_eq!(m.read_u8(STACK + 63).unwrap(), 0xAB);
        assert_eq!(m.read_u8(STACK + 64), Err(AddressError { addr: STACK + 64, size: 1 }));
    }

    #[test]
    fn oversized_layouts_are_rejected() {
        let img = LoadedImage::from_words(0x1000, &[0]);
        assert_eq!(
            AddressSpace::new(&img, u64::MAX - 8, 64, 0).unwrap_err(),
            LayoutError::StackWraps { start: u64::MAX - 8, size: 64 }
        );
        assert_eq!(
            AddressSpace::new(&img, STACK, MAX_STACK_SIZE + 1, 0).unwrap_err(),
            LayoutError::StackTooLarge { size: MAX_STACK_SIZE + 1 }
        );
    }

    #[test]
    fn straddling_access_is_rejected() {
        let mut m = space();
        assert!(m.read_u32(0x1006).is_err());
        assert!(m.write_u64(STACK + 60, 1).is_err());
        // nothing was partially written
        assert_eq!(m.read_u32(STACK + 60).unwrap(), 0);
    }
}
