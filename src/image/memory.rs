use super::{out_of_bounds, Backend};
use crate::Result;

/// Image data held in memory
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds(offset, len, self.data.len()));
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds(offset, len, self.data.len()));
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn memory() {
        let mut data = vec![0xCC_u8; 1048];
        data[10..15].fill(0xBB);

        let memory = Memory::new(data);

        assert_eq!(memory.len(), 1048);
        assert_eq!(memory.data()[42], 0xCC);
        assert_eq!(
            memory.data_slice(10, 5).unwrap(),
            &[0xBB, 0xBB, 0xBB, 0xBB, 0xBB]
        );

        assert!(memory
            .data_slice(u32::MAX as usize, u32::MAX as usize)
            .is_err());
        assert!(memory.data_slice(0, 2048).is_err());
    }

    #[test]
    fn memory_bounds() {
        let memory = Memory::new(vec![0x42]);

        assert_eq!(memory.data_slice(0, 1).unwrap(), &[0x42]);
        let empty_slice: &[u8] = &[];
        assert_eq!(memory.data_slice(1, 0).unwrap(), empty_slice);

        let err = memory.data_slice(usize::MAX, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OffsetOutOfRange);
        assert!(memory.data_slice(1, 1).is_err());

        let empty = Memory::new(vec![]);
        assert_eq!(empty.len(), 0);
        assert!(empty.data_slice(0, 1).is_err());
    }
}
