use byteorder::{ByteOrder, LittleEndian};

/// Little-endian writer for pack payloads
#[derive(Debug, Default)]
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_le() {
        let mut w = BinaryWriter::with_capacity(7);
        w.write_u16_le(0x1234);
        w.write_u32_le(0x1234_5678);
        w.write_u8(0xAB);
        assert_eq!(w.len(), 7);
        assert_eq!(w.into_vec(), vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xAB]);
    }
}
