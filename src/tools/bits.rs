//! Bit stream reading and writing.
//! The compressed format is a bit stream with no alignment inside it,
//! packed into bytes starting from the most significant bit.

use bit_vec::BitVec;

/// Accumulates single bits and fixed width fields, MSB first.
/// The final byte is padded with zero bits when the stream is packed.
pub struct BitWriter {
    bits: BitVec
}

impl BitWriter {
    pub fn new() -> Self {
        Self { bits: BitVec::new() }
    }
    /// append one bit
    pub fn put_bit(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// append the low `count` bits of `val` starting from the most significant
    pub fn put_bits(&mut self,val: u32,count: usize) {
        for i in (0..count).rev() {
            self.bits.push(val >> i & 1 > 0);
        }
    }
    /// pack the stream into bytes, padding the tail with zero bits
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }
}

/// Reads back single bits and fixed width fields, MSB first.
pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

impl BitReader {
    pub fn from_bytes(dat: &[u8]) -> Self {
        Self {
            bits: BitVec::from_bytes(dat),
            ptr: 0
        }
    }
    /// get the next bit, or None if the stream is exhausted
    pub fn get_bit(&mut self) -> Option<bool> {
        let ans = self.bits.get(self.ptr);
        if ans.is_some() {
            self.ptr += 1;
        }
        ans
    }
    /// get the next `count` bits as an unsigned value, MSB first
    pub fn get_bits(&mut self,count: usize) -> Option<u32> {
        let mut ans: u32 = 0;
        for _i in 0..count {
            ans = ans << 1 | self.get_bit()? as u32;
        }
        Some(ans)
    }
}

#[test]
fn msb_first_packing() {
    let mut writer = BitWriter::new();
    writer.put_bit(true);
    writer.put_bits(0x41,8);
    // 1 01000001 -> 10100000 1(0000000)
    assert_eq!(writer.to_bytes(),vec![0xa0,0x80]);
}

#[test]
fn field_wider_than_value() {
    let mut writer = BitWriter::new();
    writer.put_bits(1,10);
    writer.put_bits(0b1111,4);
    // 0000000001 1111 -> 00000000 011111(00)
    assert_eq!(writer.to_bytes(),vec![0x00,0x7c]);
}

#[test]
fn read_back() {
    let mut writer = BitWriter::new();
    writer.put_bit(false);
    writer.put_bits(0x2a5,10);
    writer.put_bits(0x9,4);
    let mut reader = BitReader::from_bytes(&writer.to_bytes());
    assert_eq!(reader.get_bit(),Some(false));
    assert_eq!(reader.get_bits(10),Some(0x2a5));
    assert_eq!(reader.get_bits(4),Some(0x9));
    // only padding remains
    assert_eq!(reader.get_bit(),Some(false));
}

#[test]
fn exhaustion() {
    let mut reader = BitReader::from_bytes(&[0xff]);
    assert_eq!(reader.get_bits(8),Some(0xff));
    assert_eq!(reader.get_bit(),None);
    assert_eq!(reader.get_bits(4),None);
}
