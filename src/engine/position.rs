//! Output-to-input position maps.
//!
//! A scan records, for every output character, the index of the input
//! character it came from (the *forward* map). Inverting it gives, for every
//! input character, the inclusive range of output characters it produced:
//!
//! ```text
//! input   n f k a p p a b          output  n f _ k a p p a _ b
//!         0 1 2 3 4 5 6 7                  0 1 2 3 4 5 6 7 8 9
//!
//! forward [0,1,7,2,3,4,5,6,7,7]
//! reverse [[0,0],[1,1],[3,3],[4,4],[5,5],[6,6],[7,7],[2,9]]
//! ```
//!
//! Input characters that produced nothing (dropped by a replacement) inherit
//! the range of the nearest mapped character before them; leading unmapped
//! characters inherit the first mapped range. When no character is mapped at
//! all, every entry is `None`.

/// Invert `forward` over an input of `input_len` characters.
///
/// Forward entries pointing past `input_len` are ignored.
pub fn reverse_map(forward: &[usize], input_len: usize) -> Vec<Option<[usize; 2]>> {
    let mut ranges: Vec<Option<[usize; 2]>> = vec![None; input_len];
    for (out, &at) in forward.iter().enumerate() {
        let Some(slot) = ranges.get_mut(at) else {
            continue;
        };
        *slot = match *slot {
            None => Some([out, out]),
            Some([lo, hi]) => Some([lo.min(out), hi.max(out)]),
        };
    }

    let Some(mut previous) = ranges.iter().flatten().next().copied() else {
        return ranges;
    };
    for slot in ranges.iter_mut() {
        match slot {
            Some(range) => previous = *range,
            None => *slot = Some(previous),
        }
    }
    ranges
}
