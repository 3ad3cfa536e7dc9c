// math.rs — Element-wise helpers shared by the averager.
//
// Rows, sums and means are all f64.

/// Add `row` into `acc` element-wise. Both slices have the table dimension.
pub fn accumulate(acc: &mut [f64], row: &[f64]) {
    debug_assert_eq!(acc.len(), row.len());
    for (sum, &x) in acc.iter_mut().zip(row) {
        *sum += x;
    }
}

/// Arithmetic mean of `count` accumulated rows; all zeros when `count` is 0.
pub fn mean(acc: &[f64], count: usize) -> Vec<f64> {
    if count == 0 {
        return vec![0.0; acc.len()];
    }
    let n = count as f64;
    acc.iter().map(|&sum| sum / n).collect()
}
