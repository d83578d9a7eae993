use statrs::distribution::{ContinuousCDF, StudentsT};

/// Spearman rank correlation between two paired samples with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpearmanTest {
    pub rho: f64,
    pub p_value: f64,
}

/// Returns `None` when the correlation is undefined: fewer than two pairs,
/// mismatched lengths, or a constant sample.
///
/// The p-value comes from the t statistic `rho * sqrt((n-2) / (1-rho^2))` with
/// `n-2` degrees of freedom. With only two pairs there is no degree of freedom
/// left and the p-value is NaN.
pub fn spearman_correlation(x: &[f64], y: &[f64]) -> Option<SpearmanTest> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let rx = rank_data(x);
    let ry = rank_data(y);
    let rho = pearson_correlation(&rx, &ry)?.clamp(-1.0, 1.0);

    Some(SpearmanTest {
        rho,
        p_value: two_sided_p_value(rho, x.len()),
    })
}

fn two_sided_p_value(rho: f64, n: usize) -> f64 {
    if n < 3 {
        return f64::NAN;
    }
    if rho.abs() >= 1.0 {
        return 0.0;
    }
    let dof = (n - 2) as f64;
    let t = rho * (dof / ((1.0 + rho) * (1.0 - rho))).sqrt();
    match StudentsT::new(0.0, 1.0, dof) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// 1-based ranks; tied values share their average rank.
pub fn rank_data(vals: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = vals.iter().cloned().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; vals.len()];
    let mut i = 0;
    while i < indexed.len() {
        let val = indexed[i].1;
        let mut j = i + 1;

        while j < indexed.len() && indexed[j].1 == val {
            j += 1;
        }

        let avg_rank = ((i + 1) as f64 + j as f64) / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }

        i = j;
    }

    ranks
}

pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut num, mut denom_x, mut denom_y) = (0.0, 0.0, 0.0);
    for (&xx, &yy) in x.iter().zip(y.iter()) {
        let dx = xx - mean_x;
        let dy = yy - mean_y;
        num += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denom = (denom_x * denom_y).sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(num / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn ties_get_average_rank() {
        assert_eq!(rank_data(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn monotonic_pairs_have_rho_one() {
        let test = spearman_correlation(&[1.0, 2.0, 3.0], &[1.1, 2.1, 3.3]).unwrap();
        assert_close(test.rho, 1.0, 1e-12);
        assert!(test.p_value < 1e-12);
    }

    #[test]
    fn p_value_matches_t_distribution() {
        // d^2 sum = 2, rho = 1 - 6*2 / (5*24) = 0.9
        let test = spearman_correlation(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 3.0, 2.0, 4.0, 5.0]).unwrap();
        assert_close(test.rho, 0.9, 1e-12);
        assert_close(test.p_value, 0.0374, 1e-3);
    }

    #[test]
    fn ties_match_rank_average_reference() {
        // ranks (1, 2.5, 2.5, 4, 5, 6) vs (2, 1, 3.5, 3.5, 6, 5): 13.75 / 17
        let test = spearman_correlation(
            &[1.0, 2.0, 2.0, 3.0, 4.0, 5.0],
            &[2.0, 1.0, 3.0, 3.0, 5.0, 4.0],
        )
        .unwrap();
        assert_close(test.rho, 13.75 / 17.0, 1e-12);
    }

    #[test]
    fn anticorrelated_is_negative() {
        let test = spearman_correlation(&[1.0, 2.0, 3.0, 4.0], &[8.0, 6.0, 4.0, 2.0]).unwrap();
        assert_close(test.rho, -1.0, 1e-12);
    }

    #[test]
    fn constant_sample_is_undefined() {
        assert!(spearman_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
    }

    #[test]
    fn too_few_pairs_is_undefined() {
        assert!(spearman_correlation(&[1.0], &[2.0]).is_none());
        assert!(spearman_correlation(&[], &[]).is_none());
    }

    #[test]
    fn two_pairs_have_no_p_value() {
        let test = spearman_correlation(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        assert!(test.p_value.is_nan());
    }
}
