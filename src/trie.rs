//! Compresses the flat per-codepoint array into a multi-stage lookup trie.
//!
//! Each split slices its input into fixed-size chunks, keeps every distinct
//! chunk once in a shared store, and replaces the input with the array of
//! chunk offsets. The offset array is in turn the input of the next split,
//! until the last one becomes the root stage. Two tricks shrink the store
//! beyond plain deduplication: a new chunk may be satisfied by any aligned
//! occurrence inside the store, and an appended chunk may fuse with the
//! store's tail where suffix and prefix overlap.

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{bail, Result};

/// Mask sentinel marking the root stage, which indexes with the plain
/// shifted codepoint rather than a masked chunk offset.
pub const ROOT_MASK: u32 = i32::MAX as u32;

/// One level of the lookup trie. `bits` is the narrowest element width of
/// {8, 16, 32} that holds `max(values)` and decides both the emitted
/// element type and the stage's contribution to the total size.
#[derive(Debug, Clone)]
pub struct Stage {
    pub values: Vec<u32>,
    pub shift: u32,
    pub mask: u32,
    pub bits: u32,
}

/// An ordered stack of stages, root first, leaf last.
#[derive(Debug, Clone)]
pub struct Trie {
    pub stages: Vec<Stage>,
    pub total_size: usize,
}

impl Trie {
    /// Replays the emitted lookup: the root stage is indexed with the
    /// shifted codepoint, every following stage with the previous result
    /// plus a masked chunk offset. The final result is the leaf value.
    pub fn lookup(&self, cp: u32) -> u32 {
        let root = &self.stages[0];
        let mut index = root.values[(cp >> root.shift) as usize];
        for stage in &self.stages[1..] {
            index = stage.values[(index + ((cp >> stage.shift) & stage.mask)) as usize];
        }
        index
    }

    /// Compares the lookup against the flat input for every codepoint.
    /// A mismatch means the builder corrupted the tables and nothing may
    /// be emitted.
    pub fn verify(&self, values: &[u32]) -> Result<()> {
        for (cp, &expected) in values.iter().enumerate() {
            let actual = self.lookup(cp as u32);
            if actual != expected {
                bail!("trie lookup mismatch for U+{cp:04X}: got {actual:#x}, expected {expected:#x}");
            }
        }
        Ok(())
    }
}

/// Builds a trie over `values` from an ordered list of chunk shifts, one
/// per non-root stage. The stage stack comes out root first.
pub fn build_trie(values: &[u32], shifts: &[u32]) -> Trie {
    let mut stages: Vec<Stage> = Vec::with_capacity(shifts.len() + 1);
    let mut cumulative = 0;
    let mut work = Cow::Borrowed(values);
    for &shift in shifts {
        let (compressed, offsets) = compress_stage(&work, shift);
        stages.push(Stage {
            values: compressed,
            shift: cumulative,
            mask: (1 << shift) - 1,
            bits: 0,
        });
        work = Cow::Owned(offsets);
        cumulative += shift;
    }
    stages.push(Stage {
        values: work.into_owned(),
        shift: cumulative,
        mask: ROOT_MASK,
        bits: 0,
    });
    stages.reverse();

    for stage in &mut stages {
        stage.bits = bits_for(stage.values.iter().copied().max().unwrap_or(0));
    }
    let total_size = stages
        .iter()
        .map(|stage| stage.bits as usize / 8 * stage.values.len())
        .sum();
    Trie { stages, total_size }
}

fn bits_for(max: u32) -> u32 {
    match max {
        0..=0xFF => 8,
        0x100..=0xFFFF => 16,
        _ => 32,
    }
}

/// Deduplicates `input` into chunks of `1 << shift` elements.
///
/// Returns the chunk store and one store offset per input chunk. A chunk
/// is resolved, in order of preference, by the exact-chunk cache, by an
/// aligned occurrence anywhere in the store, or by appending it minus
/// whatever prefix already overlaps the store's tail. The last chunk may
/// run short; it takes part unpadded everywhere.
fn compress_stage<'input>(input: &'input [u32], shift: u32) -> (Vec<u32>, Vec<u32>) {
    let chunk_size = 1usize << shift;
    let mut compressed: Vec<u32> = Vec::new();
    let mut offsets: Vec<u32> = Vec::with_capacity(input.len().div_ceil(chunk_size));
    let mut cache: HashMap<&'input [u32], u32> = HashMap::new();

    for chunk in input.chunks(chunk_size) {
        if let Some(&offset) = cache.get(chunk) {
            offsets.push(offset);
            continue;
        }
        let offset = match find_aligned(&compressed, chunk) {
            Some(offset) => offset,
            None => {
                let overlap = tail_overlap(&compressed, chunk);
                compressed.extend_from_slice(&chunk[overlap..]);
                (compressed.len() - chunk.len()) as u32
            }
        };
        cache.insert(chunk, offset);
        offsets.push(offset);
    }
    (compressed, offsets)
}

/// Earliest occurrence of `needle` as a contiguous sub-sequence of
/// `haystack`.
///
/// Searching the element sequence directly keeps every candidate position
/// on an element boundary; a byte-level search over serialized elements
/// would admit matches that straddle elements and corrupt the offsets
/// derived from them. The scan advances one element past a rejected
/// position.
fn find_aligned(haystack: &[u32], needle: &[u32]) -> Option<u32> {
    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        if haystack[pos..pos + needle.len()] == *needle {
            return Some(pos as u32);
        }
        pos += 1;
    }
    None
}

/// Largest n such that the last n elements of the store equal the first n
/// elements of `chunk`, so only `chunk[n..]` needs appending.
fn tail_overlap(compressed: &[u32], chunk: &[u32]) -> usize {
    let limit = chunk.len().min(compressed.len());
    (1..=limit)
        .rev()
        .find(|&n| compressed[compressed.len() - n..] == chunk[..n])
        .unwrap_or(0)
}
