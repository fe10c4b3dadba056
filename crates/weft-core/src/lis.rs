//! Longest increasing subsequence over a sparse position array.

/// Indices (ascending) into `positions` of one longest strictly increasing
/// subsequence of its `Some` values. `None` entries never take part.
///
/// Patience sorting with binary search, O(n log n). A value larger than every
/// current tail extends the longest run without a search.
pub fn longest_increasing_subsequence(positions: &[Option<usize>]) -> Vec<usize> {
    // tails[k] is the smallest tail of an increasing run of length k + 1;
    // tail_indices[k] is where in `positions` that tail lives.
    let mut tails: Vec<usize> = Vec::new();
    let mut tail_indices: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; positions.len()];

    for (index, &position) in positions.iter().enumerate() {
        let Some(value) = position else {
            continue;
        };
        let slot = match tails.last() {
            Some(&last) if last < value => tails.len(),
            _ => tails.partition_point(|&tail| tail < value),
        };
        if slot > 0 {
            predecessors[index] = Some(tail_indices[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(value);
            tail_indices.push(index);
        } else {
            tails[slot] = value;
            tail_indices[slot] = index;
        }
    }

    let mut sequence = vec![0; tails.len()];
    let mut cursor = tail_indices.last().copied();
    for slot in (0..sequence.len()).rev() {
        if let Some(index) = cursor {
            sequence[slot] = index;
            cursor = predecessors[index];
        }
    }
    sequence
}

#[cfg(test)]
#[path = "tests/lis_tests.rs"]
mod tests;
