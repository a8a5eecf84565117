//! Ring buffer for LZ type compression windows
use num_traits::PrimInt;

/// A fixed buffer addressed by absolute position, wrapping with a mask.
/// The length must be a power of two so that wrapping is a single AND.
pub struct RingBuffer<T: PrimInt> {
    buf: Vec<T>,
    mask: usize
}

impl <T: PrimInt> RingBuffer<T> {
    /// Create a buffer of length `n` with every slot set to `fill`.
    /// Panics if `n` is not a power of two.
    pub fn create(fill: T,n: usize) -> Self {
        assert!(n.is_power_of_two());
        Self {
            buf: vec![fill;n],
            mask: n - 1
        }
    }
    /// get value at absolute position
    pub fn get(&self,pos: usize) -> T {
        self.buf[pos & self.mask]
    }
    /// set value at absolute position
    pub fn set(&mut self,pos: usize,val: T) {
        self.buf[pos & self.mask] = val;
    }
}

#[test]
fn wrapping() {
    let mut ring: RingBuffer<u8> = RingBuffer::create(0,4);
    ring.set(5,7);
    assert_eq!(ring.get(1),7);
    assert_eq!(ring.get(5),7);
    assert_eq!(ring.get(9),7);
    ring.set(2,9);
    assert_eq!(ring.get(6),9);
}

#[test]
fn fill_value() {
    let ring: RingBuffer<u8> = RingBuffer::create(32,8);
    for i in 0..16 {
        assert_eq!(ring.get(i),32);
    }
}
