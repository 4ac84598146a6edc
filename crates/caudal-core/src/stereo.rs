//! Channel fan-out/fan-in helpers for the stereo-split mechanism.
//!
//! A 2-channel stage whose effect lacks native multichannel support runs as
//! two independent mono instances. These helpers split interleaved frames
//! into per-channel buffers before the pair and merge them afterward.

/// Split interleaved stereo samples into left/right buffers.
///
/// Even-indexed samples go to `left`, odd-indexed to `right`. For an odd
/// sample count the left buffer receives the extra sample, so `left` holds
/// `ceil(n/2)` samples and `right` holds `floor(n/2)`.
///
/// Both output buffers are cleared first.
pub fn deinterleave(interleaved: &[f32], left: &mut Vec<f32>, right: &mut Vec<f32>) {
    left.clear();
    right.clear();
    left.reserve(interleaved.len().div_ceil(2));
    right.reserve(interleaved.len() / 2);
    for (i, &sample) in interleaved.iter().enumerate() {
        if i % 2 == 0 {
            left.push(sample);
        } else {
            right.push(sample);
        }
    }
}

/// Merge per-channel buffers back into interleaved frames, left then right,
/// in lock-step for `count` samples per channel.
///
/// Writes `2 * count` samples starting at `out[0]` and returns that length.
/// Callers guarantee `count <= left.len()`, `count <= right.len()`, and
/// `out.len() >= 2 * count`.
pub fn interleave(left: &[f32], right: &[f32], count: usize, out: &mut [f32]) -> usize {
    debug_assert!(count <= left.len() && count <= right.len());
    debug_assert!(out.len() >= 2 * count);
    for i in 0..count {
        out[2 * i] = left[i];
        out[2 * i + 1] = right[i];
    }
    2 * count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_count_splits_evenly() {
        let mut left = Vec::new();
        let mut right = Vec::new();
        deinterleave(&[1.0, 2.0, 3.0, 4.0], &mut left, &mut right);
        assert_eq!(left, vec![1.0, 3.0]);
        assert_eq!(right, vec![2.0, 4.0]);
    }

    #[test]
    fn odd_count_gives_left_the_extra_sample() {
        let mut left = Vec::new();
        let mut right = Vec::new();
        deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0], &mut left, &mut right);
        assert_eq!(left, vec![1.0, 3.0, 5.0]);
        assert_eq!(right, vec![2.0, 4.0]);
    }

    #[test]
    fn empty_input() {
        let mut left = vec![9.0];
        let mut right = vec![9.0];
        deinterleave(&[], &mut left, &mut right);
        assert!(left.is_empty());
        assert!(right.is_empty());
    }

    #[test]
    fn interleave_lock_step() {
        let left = [1.0, 3.0, 5.0];
        let right = [2.0, 4.0, 6.0];
        let mut out = [0.0f32; 6];
        let n = interleave(&left, &right, 3, &mut out);
        assert_eq!(n, 6);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn interleave_shorter_count() {
        let left = [1.0, 3.0, 5.0];
        let right = [2.0, 4.0];
        let mut out = [0.0f32; 4];
        let n = interleave(&left, &right, 2, &mut out);
        assert_eq!(n, 4);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }
}
