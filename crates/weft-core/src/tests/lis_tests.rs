use super::*;

fn values(positions: &[Option<usize>], indices: &[usize]) -> Vec<usize> {
    indices.iter().filter_map(|&i| positions[i]).collect()
}

#[test]
fn empty_and_all_none() {
    assert!(longest_increasing_subsequence(&[]).is_empty());
    assert!(longest_increasing_subsequence(&[None, None]).is_empty());
}

#[test]
fn sorted_input_is_kept_whole() {
    let positions: Vec<_> = (0..6).map(Some).collect();
    assert_eq!(longest_increasing_subsequence(&positions), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn reversed_input_keeps_one() {
    let positions = [Some(4), Some(3), Some(2), Some(1), Some(0)];
    assert_eq!(longest_increasing_subsequence(&positions).len(), 1);
}

#[test]
fn skips_none_entries() {
    let positions = [Some(2), None, Some(0), Some(1), None, Some(3)];
    let lis = longest_increasing_subsequence(&positions);
    assert_eq!(lis, vec![2, 3, 5]);
}

#[test]
fn result_is_strictly_increasing_and_maximal() {
    let positions = [Some(3), Some(1), Some(4), Some(1), Some(5), Some(9), Some(2), Some(6)];
    let lis = longest_increasing_subsequence(&positions);

    assert_eq!(lis.len(), 4);
    assert!(lis.windows(2).all(|w| w[0] < w[1]));
    let picked = values(&positions, &lis);
    assert!(picked.windows(2).all(|w| w[0] < w[1]));
}
