//! Longest common subsequence over child lists.

/// Returns the index pairs of a longest common subsequence of `a` and `b`
/// under the equivalence `eq`, in ascending order.
///
/// Ties are broken towards the earliest elements of `a`, so the result is
/// deterministic for a given input.
pub fn lcs<A, B, F>(a: &[A], b: &[B], eq: F) -> Vec<(usize, usize)>
where
    F: Fn(&A, &B) -> bool,
{
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return Vec::new();
    }
    // lengths[i][j] = LCS length of a[i..] and b[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if eq(&a[i], &b[j]) {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(&a[i], &b[j]) && lengths[i][j] == lengths[i + 1][j + 1] + 1 {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}
