//! Non-parametric significance testing between variant series
//!
//! Omnibus Kruskal-Wallis H test across all qualifying variants, then
//! two-sided Mann-Whitney U tests for every unordered pair. Both use average
//! ranks for ties; p-values come from the chi-squared and normal
//! approximations. A degenerate input (every observation tied) makes the
//! rank variance collapse; that test is skipped with a log message instead
//! of aborting the rest.

use crate::collect::VariantSeries;
use crate::variant::Variant;
use serde::Serialize;
use tracing::{info, warn};

/// Significance level for all tests
pub const ALPHA: f64 = 0.05;

/// Kruskal-Wallis result across all qualifying variants
#[derive(Debug, Clone, Serialize)]
pub struct OmnibusResult {
    pub h_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Mann-Whitney U result for one unordered variant pair
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseResult {
    pub first: Variant,
    pub second: Variant,
    pub u_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Everything the significance tester produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignificanceReport {
    pub omnibus: Option<OmnibusResult>,
    pub pairwise: Vec<PairwiseResult>,
}

/// Run the omnibus and pairwise tests over all qualifying variants.
///
/// A variant qualifies with at least 2 post-warm-up samples; fewer than two
/// qualifying variants yields an empty report.
pub fn run_tests(series: &[VariantSeries]) -> SignificanceReport {
    let qualifying: Vec<(Variant, Vec<f64>)> = series
        .iter()
        .filter_map(|s| {
            let values = s.post_warmup();
            if values.len() < 2 {
                warn!(variant = %s.variant, "too few samples for significance testing");
                return None;
            }
            Some((s.variant, values))
        })
        .collect();

    if qualifying.len() < 2 {
        info!("fewer than two qualifying variants, skipping significance tests");
        return SignificanceReport::default();
    }

    let groups: Vec<&[f64]> = qualifying.iter().map(|(_, v)| v.as_slice()).collect();
    let omnibus = match kruskal_wallis(&groups) {
        Some((h_statistic, p_value)) => Some(OmnibusResult {
            h_statistic,
            p_value,
            significant: p_value < ALPHA,
        }),
        None => {
            warn!("Kruskal-Wallis test degenerate (all observations tied), skipping");
            None
        }
    };

    let mut pairwise = Vec::new();
    for i in 0..qualifying.len() {
        for j in (i + 1)..qualifying.len() {
            let (first, ref a) = qualifying[i];
            let (second, ref b) = qualifying[j];
            match mann_whitney_u(a, b) {
                Some((u_statistic, p_value)) => pairwise.push(PairwiseResult {
                    first,
                    second,
                    u_statistic,
                    p_value,
                    significant: p_value < ALPHA,
                }),
                None => {
                    warn!(%first, %second, "Mann-Whitney test degenerate, skipping pair");
                }
            }
        }
    }

    SignificanceReport { omnibus, pairwise }
}

/// Two-sided Mann-Whitney U test with normal approximation.
///
/// Returns `(U, p)` where U is the smaller of the two rank-sum statistics.
/// `None` when the tie-corrected rank variance is zero (every observation
/// identical), mirroring the error the reference implementation caught.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<(f64, f64)> {
    let n1 = a.len();
    let n2 = b.len();
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let combined: Vec<(f64, usize)> = a
        .iter()
        .map(|&x| (x, 0))
        .chain(b.iter().map(|&x| (x, 1)))
        .collect();
    let (ranks, tie_sum) = rank_with_ties(combined);

    let r1: f64 = ranks
        .iter()
        .filter(|(_, group)| *group == 0)
        .map(|(rank, _)| rank)
        .sum();

    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.min(u2);

    let n = (n1 + n2) as f64;
    let mu = (n1 * n2) as f64 / 2.0;
    // Tie-corrected variance of U
    let variance = ((n1 * n2) as f64 / 12.0) * ((n + 1.0) - tie_sum / (n * (n - 1.0)));
    if variance <= 0.0 {
        return None;
    }

    let z = (u - mu) / variance.sqrt();
    let p = (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0);
    Some((u, p))
}

/// Kruskal-Wallis H test across k groups with tie correction.
///
/// Returns `(H, p)` via the chi-squared approximation with k − 1 degrees of
/// freedom, or `None` when the tie correction collapses to zero.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Option<(f64, f64)> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }

    let combined: Vec<(f64, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.iter().map(move |&x| (x, i)))
        .collect();
    let n = combined.len() as f64;
    let (ranks, tie_sum) = rank_with_ties(combined);

    let mut rank_sums = vec![0.0; k];
    for (rank, group) in &ranks {
        rank_sums[*group] += rank;
    }

    let h = (12.0 / (n * (n + 1.0)))
        * groups
            .iter()
            .zip(&rank_sums)
            .map(|(g, r)| r * r / g.len() as f64)
            .sum::<f64>()
        - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_sum / (n.powi(3) - n);
    if correction <= 0.0 {
        return None;
    }

    let h = h / correction;
    let p = chi_squared_sf(h.max(0.0), (k - 1) as f64).clamp(0.0, 1.0);
    Some((h, p))
}

/// Assign average ranks to tied values.
///
/// Returns `(rank, group)` per observation and the tie-correction sum
/// Σ(t³ − t) over all tie runs.
fn rank_with_ties(mut combined: Vec<(f64, usize)>) -> (Vec<(f64, usize)>, f64) {
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = Vec::with_capacity(combined.len());
    let mut tie_sum = 0.0;
    let mut i = 0;

    while i < combined.len() {
        let value = combined[i].0;
        let mut j = i;
        while j < combined.len() && (combined[j].0 - value).abs() < 1e-10 {
            j += 1;
        }

        // Positions i..j share the average of ranks (i+1)..=j
        let avg_rank = ((i + 1)..=j).map(|r| r as f64).sum::<f64>() / (j - i) as f64;
        for item in combined.iter().take(j).skip(i) {
            ranks.push((avg_rank, item.1));
        }

        let t = (j - i) as f64;
        tie_sum += t.powi(3) - t;
        i = j;
    }

    (ranks, tie_sum)
}

/// Normal CDF approximation (Abramowitz and Stegun)
#[allow(clippy::unreadable_literal)] // Standard statistical constants
fn normal_cdf(x: f64) -> f64 {
    let a1 = 0.254_829_592;
    let a2 = -0.284_496_736;
    let a3 = 1.421_413_741;
    let a4 = -1.453_152_027;
    let a5 = 1.061_405_429;
    let p = 0.327_591;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

/// Chi-squared survival function P(X > x) with `df` degrees of freedom
fn chi_squared_sf(x: f64, df: f64) -> f64 {
    1.0 - regularized_gamma_p(df / 2.0, x / 2.0)
}

/// Regularized lower incomplete gamma P(a, x), series/continued-fraction split
fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }

    if x < a + 1.0 {
        // Series representation converges quickly here
        let mut ap = a;
        let mut sum = 1.0 / a;
        let mut del = sum;
        for _ in 0..200 {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * 1e-12 {
                break;
            }
        }
        sum * (a * x.ln() - x - ln_gamma(a)).exp()
    } else {
        // Lentz continued fraction for Q(a, x)
        let mut b = x + 1.0 - a;
        let mut c = 1e300_f64;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..200 {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < 1e-300 {
                d = 1e-300;
            }
            c = b + an / c;
            if c.abs() < 1e-300 {
                c = 1e-300;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < 1e-12 {
                break;
            }
        }
        1.0 - (a * x.ln() - x - ln_gamma(a)).exp() * h
    }
}

/// Lanczos approximation of ln Γ(x)
#[allow(clippy::unreadable_literal)] // Standard Lanczos coefficients
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let tmp = x + 5.5;
    let tmp = (x + 0.5) * tmp.ln() - tmp;
    let mut y = x;
    let mut ser = 1.000000000190015;
    for c in COEFFS {
        y += 1.0;
        ser += c / y;
    }
    tmp + (2.5066282746310005 * ser / x).ln()
}
