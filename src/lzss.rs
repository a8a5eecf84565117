//! LZSS Compression with a Binary Tree Index
//!
//! This performs plain LZSS coding in the style described in Mark Nelson's
//! "The Data Compression Book".  Compression is achieved by replacing byte
//! runs found in previously read data with position/length pairs pointing
//! into a sliding window.  A run that would cost more bits as a pair than
//! as raw bytes is passed through uncompressed, with a one bit flag telling
//! the two record kinds apart.
//!
//! * Memory is fixed up front, the window and the tree never grow
//! * The stream is self terminating, there is no header or size field
//!
//! Record layout, most significant bit first: a literal is a `1` flag and
//! the 8 bit byte.  A match is a `0` flag, a 10 bit window position and a
//! 4 bit length biased so that the smallest code means 2 bytes.  A match
//! record with position zero ends the stream, so window position zero is
//! never indexed and the window is consumed starting from position one.
//!
//! To speed up the search for matches a binary tree over window positions
//! is maintained as bytes enter and leave the window.  Nodes are ordered
//! by the byte runs rooted at each position, so one descent finds both the
//! best match and the insertion point for the current position.

use std::io::{Cursor,Read,Write,BufReader};
use crate::tools::ring_buffer::RingBuffer;
use crate::tools::bits::{BitWriter,BitReader};
use crate::Error;

// LZSS coding constants

/// bits used to encode a window position
const INDEX_BIT_COUNT: usize = 10;
/// bits used to encode a match length
const LENGTH_BIT_COUNT: usize = 4;
/// size of the sliding window
const WINDOW_SIZE: usize = 1 << INDEX_BIT_COUNT;
/// number of distinct lengths the length field can hold
const RAW_LOOK_AHEAD_SIZE: usize = 1 << LENGTH_BIT_COUNT;
/// matches at or below this length cost more as a pair than as literals,
/// a literal record is 9 bits while a match record is 15
const BREAK_EVEN: usize = (1 + INDEX_BIT_COUNT + LENGTH_BIT_COUNT) / 9;
/// maximum number of bytes a single match can cover
const LOOK_AHEAD_SIZE: usize = RAW_LOOK_AHEAD_SIZE + BREAK_EVEN;
/// slot of the permanent sentinel above the real root
const TREE_ROOT: usize = WINDOW_SIZE;
/// marks an absent parent or child, window position 0 is never a live node
const UNUSED: usize = 0;
/// position value that terminates the stream
const END_OF_STREAM: usize = 0;

/// reduce any position to a window index
fn mod_window(pos: usize) -> usize {
    pos & (WINDOW_SIZE - 1)
}

/// One slot of the tree.  The fields hold window positions, or `UNUSED`.
#[derive(Clone,Copy,Default)]
struct Node {
    parent: usize,
    small_child: usize,
    large_child: usize
}

/// Structure to perform the LZSS compression.  This maintains two
/// components: a sliding window containing the symbols in the order
/// encountered ("dictionary"), and a binary search tree whose nodes are
/// window positions ordered by the byte runs rooted there ("index").
/// The tree slot past the window is a sentinel whose large child is the
/// real root.
struct Lzss {
    dictionary: RingBuffer<u8>,
    tree: Vec<Node>,
    match_length: usize,
    match_position: usize
}

impl Lzss {
    fn new() -> Self {
        Self {
            dictionary: RingBuffer::create(0,WINDOW_SIZE),
            tree: vec![Node::default();WINDOW_SIZE + 1],
            match_length: 0,
            match_position: 0
        }
    }
    /// Establish the tree with `root_child` as the only real node.
    fn init_tree(&mut self,root_child: usize) {
        self.tree[TREE_ROOT] = Node {
            parent: UNUSED,
            small_child: UNUSED,
            large_child: root_child
        };
        self.tree[root_child] = Node {
            parent: TREE_ROOT,
            small_child: UNUSED,
            large_child: UNUSED
        };
    }
    /// Splice `new_node` into the place of `old_node`.  This assumes
    /// `new_node` is a descendant of `old_node`, or `UNUSED` when the old
    /// node is a leaf.  The reparenting write lands in slot 0 in the
    /// `UNUSED` case, which is harmless, slot 0 is never read as live.
    fn contract_node(&mut self,old_node: usize,new_node: usize) {
        let parent = self.tree[old_node].parent;
        self.tree[new_node].parent = parent;
        if self.tree[parent].large_child == old_node {
            self.tree[parent].large_child = new_node;
        } else {
            self.tree[parent].small_child = new_node;
        }
        self.tree[old_node] = Node::default();
    }
    /// Put `new_node`, not previously in the tree, in the exact place of
    /// `old_node`, inheriting both children.
    fn replace_node(&mut self,old_node: usize,new_node: usize) {
        let parent = self.tree[old_node].parent;
        if self.tree[parent].small_child == old_node {
            self.tree[parent].small_child = new_node;
        } else {
            self.tree[parent].large_child = new_node;
        }
        self.tree[new_node] = self.tree[old_node];
        // absent children put these writes in slot 0, harmless as above
        let small = self.tree[new_node].small_child;
        let large = self.tree[new_node].large_child;
        self.tree[small].parent = new_node;
        self.tree[large].parent = new_node;
        self.tree[old_node] = Node::default();
    }
    /// Find the largest node on the small side of `node`.  The result has
    /// no large child.  Assumes the small child exists.
    fn find_next_node(&self,node: usize) -> usize {
        let mut next = self.tree[node].small_child;
        while self.tree[next].large_child != UNUSED {
            next = self.tree[next].large_child;
        }
        next
    }
    /// Remove `node` from the tree.  Positions that were never inserted,
    /// or were already removed, are left alone.
    fn delete_node(&mut self,node: usize) {
        if self.tree[node].parent == UNUSED {
            return;
        }
        if self.tree[node].large_child == UNUSED {
            let small = self.tree[node].small_child;
            self.contract_node(node,small);
        } else if self.tree[node].small_child == UNUSED {
            let large = self.tree[node].large_child;
            self.contract_node(node,large);
        } else {
            // two children: the largest node on the small side takes over.
            // it has no large child, so it contracts away cleanly first.
            let repl = self.find_next_node(node);
            let small = self.tree[repl].small_child;
            self.contract_node(repl,small);
            self.replace_node(node,repl);
        }
    }
    /// Insert `new_node` into the tree, recording the best match among the
    /// nodes already there in `match_length` and `match_position`.  When
    /// the whole look ahead matches an existing node the older node is
    /// replaced by `new_node`, otherwise duplicates would pile up.
    fn add_node(&mut self,new_node: usize) {
        self.match_length = 0;
        if new_node == END_OF_STREAM {
            return;
        }
        let mut test_node = self.tree[TREE_ROOT].large_child;
        loop {
            // compare the byte runs until they differ. on exit `i` is the
            // number of matching bytes and the sign of `delta` orders the
            // mismatched pair.
            let mut delta: i16 = 0;
            let mut i: usize = 0;
            while i < LOOK_AHEAD_SIZE && delta == 0 {
                delta = self.dictionary.get(new_node + i) as i16
                    - self.dictionary.get(test_node + i) as i16;
                i += 1;
            }
            if delta != 0 {
                i -= 1;
            }
            if i >= self.match_length {
                self.match_length = i;
                self.match_position = test_node;
                if self.match_length >= LOOK_AHEAD_SIZE {
                    self.replace_node(test_node,new_node);
                    return;
                }
            }
            let child = match delta >= 0 {
                true => self.tree[test_node].large_child,
                false => self.tree[test_node].small_child
            };
            if child == UNUSED {
                if delta >= 0 {
                    self.tree[test_node].large_child = new_node;
                } else {
                    self.tree[test_node].small_child = new_node;
                }
                self.tree[new_node] = Node {
                    parent: test_node,
                    small_child: UNUSED,
                    large_child: UNUSED
                };
                return;
            }
            test_node = child;
        }
    }
}

/// Main compression function.  Bytes are pulled from `expanded_in` one at
/// a time and the packed bit stream is written to `compressed_out`.
/// Returns (bytes read, bytes written) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W) -> Result<(u64,u64),Error>
where R: Read, W: Write {
    let mut bytes = BufReader::new(expanded_in).bytes().fuse();
    let mut sink = BitWriter::new();
    let mut lzss = Lzss::new();
    let mut in_count: u64 = 0;

    // fill the look-ahead buffer, which occupies the window just in
    // front of the current position
    let mut win_pos: usize = 1;
    let mut ahead_bytes: usize = 0;
    let mut eos_reached = false;
    while ahead_bytes < LOOK_AHEAD_SIZE && !eos_reached {
        match bytes.next() {
            Some(Ok(c)) => {
                lzss.dictionary.set(win_pos + ahead_bytes,c);
                ahead_bytes += 1;
                in_count += 1;
            },
            None => eos_reached = true,
            Some(Err(e)) => return Err(Error::Io(e))
        }
    }
    lzss.init_tree(win_pos);
    // main compression loop
    while ahead_bytes > 0 {
        // near the end of input the look-ahead shrinks below a previously
        // recorded match, the match cannot be coded longer than that
        if lzss.match_length > ahead_bytes {
            lzss.match_length = ahead_bytes;
        }
        let repl_count: usize;
        if lzss.match_length <= BREAK_EVEN || lzss.match_position == END_OF_STREAM {
            // too short to pay for a match record, or nothing recorded
            // yet. a match at position zero would read back as the
            // terminator, so it is also forced through here.
            repl_count = 1;
            sink.put_bit(true);
            sink.put_bits(lzss.dictionary.get(win_pos) as u32,8);
        } else {
            debug_assert!(lzss.match_length <= LOOK_AHEAD_SIZE);
            sink.put_bit(false);
            sink.put_bits(lzss.match_position as u32,INDEX_BIT_COUNT);
            sink.put_bits((lzss.match_length - (BREAK_EVEN + 1)) as u32,LENGTH_BIT_COUNT);
            repl_count = lzss.match_length;
        }
        // slide the window over the coded bytes
        for _i in 0..repl_count {
            // the slot at the far edge is about to be overwritten
            lzss.delete_node(mod_window(win_pos + LOOK_AHEAD_SIZE));
            match bytes.next() {
                Some(Ok(c)) => {
                    lzss.dictionary.set(win_pos + LOOK_AHEAD_SIZE,c);
                    in_count += 1;
                },
                None => ahead_bytes -= 1,
                Some(Err(e)) => return Err(Error::Io(e))
            }
            win_pos = mod_window(win_pos + 1);
            if ahead_bytes != 0 {
                lzss.add_node(win_pos);
            }
        }
    }
    // terminator: a match record at position zero, with no length field
    sink.put_bit(false);
    sink.put_bits(END_OF_STREAM as u32,INDEX_BIT_COUNT);
    let packed = sink.to_bytes();
    compressed_out.write_all(&packed)?;
    Ok((in_count,packed.len() as u64))
}

/// Main expansion function.  The window is rebuilt with the same modular
/// arithmetic as the compressor, so match records copy from it directly.
/// Returns (bytes read, bytes written) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W) -> Result<(u64,u64),Error>
where R: Read, W: Write {
    let mut compressed = Vec::new();
    compressed_in.read_to_end(&mut compressed)?;
    let mut source = BitReader::from_bytes(&compressed);
    let mut dictionary: RingBuffer<u8> = RingBuffer::create(0,WINDOW_SIZE);
    let mut ans = Vec::new();
    let mut win_pos: usize = 1;
    loop {
        if source.get_bit().ok_or(Error::TruncatedStream)? {
            let c = source.get_bits(8).ok_or(Error::TruncatedStream)? as u8;
            ans.push(c);
            dictionary.set(win_pos,c);
            win_pos = mod_window(win_pos + 1);
        } else {
            let match_position = source.get_bits(INDEX_BIT_COUNT)
                .ok_or(Error::TruncatedStream)? as usize;
            if match_position == END_OF_STREAM {
                break;
            }
            let length_field = source.get_bits(LENGTH_BIT_COUNT)
                .ok_or(Error::TruncatedStream)? as usize;
            let match_length = length_field + BREAK_EVEN + 1;
            // copy byte by byte, a match may overlap the bytes it produces
            for i in 0..match_length {
                let c = dictionary.get(match_position + i);
                ans.push(c);
                dictionary.set(win_pos,c);
                win_pos = mod_window(win_pos + 1);
            }
        }
    }
    expanded_out.write_all(&ans)?;
    Ok((compressed.len() as u64,ans.len() as u64))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans)?;
    Ok(ans.into_inner())
}

#[cfg(test)]
fn check_tree(lzss: &Lzss) {
    // every live node is exactly one child of its parent
    for n in 1..WINDOW_SIZE {
        let node = lzss.tree[n];
        if node.parent == UNUSED {
            continue;
        }
        let parent = lzss.tree[node.parent];
        let is_small = parent.small_child == n;
        let is_large = parent.large_child == n;
        assert!(is_small != is_large,"node {} badly linked",n);
    }
    // and every live node is reachable from the sentinel root
    let mut reachable = 0;
    let mut stack = vec![lzss.tree[TREE_ROOT].large_child];
    while let Some(n) = stack.pop() {
        if n == UNUSED {
            continue;
        }
        reachable += 1;
        stack.push(lzss.tree[n].small_child);
        stack.push(lzss.tree[n].large_child);
    }
    let live = (1..WINDOW_SIZE).filter(|n| lzss.tree[*n].parent != UNUSED).count();
    assert_eq!(reachable,live);
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[]).expect("compression failed");
    // just the terminator, 11 bits
    assert_eq!(compressed,hex::decode("0000").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn single_literal() {
    let compressed = compress_slice(b"A").expect("compression failed");
    // literal 'A' then the terminator, 20 bits
    assert_eq!(compressed,hex::decode("a08000").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,b"A");
}

#[test]
fn two_literals() {
    let compressed = compress_slice(b"AB").expect("compression failed");
    // two literals then the terminator, 29 bits
    assert_eq!(compressed,hex::decode("a0d08000").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,b"AB");
}

#[test]
fn run_becomes_one_match() {
    let test_data = [b'A';18];
    let compressed = compress_slice(&test_data).expect("compression failed");
    // literal 'A', then a match at position 1 covering the remaining 17
    // bytes (the copy overlaps its own output), then the terminator
    assert_eq!(compressed,hex::decode("a0801f0000").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,test_data);
}

#[test]
fn alternating_pair() {
    let compressed = compress_slice(b"ABABABAB").expect("compression failed");
    // literals 'A' 'B', then a match at position 1 of length 6
    assert_eq!(compressed,hex::decode("a0d0800a0000").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,b"ABABABAB");
}

#[test]
fn matchless_input_is_all_literals() {
    let test_data: Vec<u8> = (0u8..=255).collect();
    let compressed = compress_slice(&test_data).expect("compression failed");
    // 9 bits per byte plus the 11 bit terminator
    assert_eq!(compressed.len(),(9*256 + 11 + 7)/8);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,test_data);
}

#[test]
fn deterministic_output() {
    let test_data = b"I do not like green eggs and ham. I do not like them, Sam-I-Am.\n";
    let first = compress_slice(test_data).expect("compression failed");
    let second = compress_slice(test_data).expect("compression failed");
    assert_eq!(first,second);
}

#[test]
fn text_invertibility() {
    let test_data = "the rain in Spain stays mainly in the plain\n".repeat(40);
    let compressed = compress_slice(test_data.as_bytes()).expect("compression failed");
    assert!(compressed.len() < test_data.len());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,test_data.as_bytes());
}

#[test]
fn random_invertibility() {
    use rand::{rngs::StdRng,Rng,SeedableRng};
    let mut rng = StdRng::seed_from_u64(311);
    let test_data: Vec<u8> = (0..4096).map(|_| rng.gen()).collect();
    let compressed = compress_slice(&test_data).expect("compression failed");
    // worst case is all literals
    assert!(compressed.len() <= (9*4096 + 11 + 7)/8);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,test_data);
}

#[test]
fn long_wraparound_invertibility() {
    // long enough that the window wraps several times and far edge
    // deletions are hitting live nodes throughout
    let mut test_data = Vec::new();
    for i in 0..6000 {
        test_data.push((i % 251) as u8);
        if i % 17 == 0 {
            test_data.extend_from_slice(b"abcabcabc");
        }
    }
    let compressed = compress_slice(&test_data).expect("compression failed");
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,test_data);
}

#[test]
fn truncated_stream_is_an_error() {
    let compressed = compress_slice(b"a few literal bytes").expect("compression failed");
    // cut inside the record stream, before the terminator
    let cut = &compressed[0..2];
    assert!(matches!(expand_slice(cut),Err(Error::TruncatedStream)));
}

#[test]
fn tree_stays_consistent() {
    let mut lzss = Lzss::new();
    // window content with enough repetition to force every descent and
    // replacement path in the search
    for i in 0..WINDOW_SIZE {
        lzss.dictionary.set(i,((i % 7) * 3 + i % 13) as u8);
    }
    lzss.init_tree(1);
    check_tree(&lzss);
    for pos in 2..300 {
        lzss.add_node(pos);
        check_tree(&lzss);
        assert!(lzss.match_length <= LOOK_AHEAD_SIZE);
        assert_ne!(lzss.match_position,0);
    }
    // deleting a slot that was never inserted is a no-op
    lzss.delete_node(900);
    check_tree(&lzss);
    // delete interior and leaf nodes in an order unrelated to insertion
    for pos in (2..300).step_by(3) {
        lzss.delete_node(pos);
        check_tree(&lzss);
    }
    for pos in (2..300).rev() {
        lzss.delete_node(pos);
        check_tree(&lzss);
    }
}
