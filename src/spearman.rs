use crate::cli::OnMissing;
use crate::error::{GrnError, GrnResult};
use crate::expression::ExpressionMatrix;
use crate::network::{Edge, Network};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Options for annotating a network with correlations.
#[derive(Debug, Clone)]
pub struct AnnotateOpts {
    /// Size of the worker pool.
    pub threads: usize,
    /// Drop edges with importance below this before correlating.
    pub min_importance: f64,
    pub on_missing: OnMissing,
}

impl Default for AnnotateOpts {
    fn default() -> Self {
        AnnotateOpts {
            threads: 1,
            min_importance: 0.005,
            on_missing: OnMissing::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairCorrelation {
    pub regulator: String,
    pub target: String,
    pub correlation: f64,
}

/// Fractional ranks starting at 1, ties get the mean of their positions.
/// # Example
/// ```
/// use grnkit::spearman::rank;
/// assert_eq!(rank(&[10.0, 30.0, 20.0]), vec![1.0, 3.0, 2.0]);
/// assert_eq!(rank(&[5.0, 1.0, 5.0, 5.0]), vec![3.0, 1.0, 3.0, 3.0]);
/// ```
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j are tied, 1-based mean rank
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Spearman's rho between two expression vectors of equal length.
/// NaN when either vector is constant or holds a NaN.
/// # Example
/// ```
/// use grnkit::spearman::spearman;
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert!((spearman(&x, &[5.0, 6.0, 7.0, 8.0, 100.0]) - 1.0).abs() < 1e-12);
/// assert!((spearman(&x, &[5.0, 4.0, 3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
/// assert!(spearman(&x, &[2.0, 2.0, 2.0, 2.0, 2.0]).is_nan());
/// ```
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return f64::NAN;
    }
    pearson(&rank(x), &rank(y))
}

fn pair_correlation(
    ex: &ExpressionMatrix,
    regulator: &str,
    target: &str,
) -> Result<f64, String> {
    let x = ex.get(regulator).ok_or_else(|| regulator.to_string())?;
    let y = ex.get(target).ok_or_else(|| target.to_string())?;
    Ok(spearman(x, y))
}

/// Correlate every (regulator, target) pair on a bounded pool of workers.
///
/// The output keeps the order of `pairs`. Under [`OnMissing::Abort`] a gene
/// absent from the matrix fails the whole batch; under [`OnMissing::Skip`]
/// the pair is left out and reported.
pub fn correlate_pairs(
    ex: &ExpressionMatrix,
    pairs: &[(String, String)],
    opts: &AnnotateOpts,
) -> GrnResult<Vec<PairCorrelation>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads)
        .build()?;
    log::debug!("Allocated {} worker threads", pool.current_num_threads());

    let skipped = AtomicUsize::new(0);
    let results: Vec<Option<PairCorrelation>> = pool.install(|| {
        pairs
            .par_iter()
            .map(|(regulator, target)| match pair_correlation(ex, regulator, target) {
                Ok(correlation) => Ok(Some(PairCorrelation {
                    regulator: regulator.clone(),
                    target: target.clone(),
                    correlation,
                })),
                Err(gene) => match opts.on_missing {
                    OnMissing::Abort => Err(GrnError::MissingGene {
                        gene,
                        regulator: regulator.clone(),
                        target: target.clone(),
                    }),
                    OnMissing::Skip => {
                        log::warn!(
                            "Skipping {} -> {}: {} is not in the expression matrix",
                            regulator,
                            target,
                            gene
                        );
                        skipped.fetch_add(1, Ordering::Relaxed);
                        Ok(None)
                    }
                },
            })
            .collect::<GrnResult<Vec<_>>>()
    })?;

    let skipped = skipped.into_inner();
    if skipped > 0 {
        log::warn!("Skipped {} pairs with genes missing from the expression matrix", skipped);
    }
    Ok(results.into_iter().flatten().collect())
}

/// Inner join correlations back onto the edges on (regulator, target).
/// Edge order is kept, edges without a correlation are dropped.
pub fn join_correlations(edges: &[Edge], results: &[PairCorrelation]) -> Network {
    let lookup: HashMap<(&str, &str), f64> = results
        .iter()
        .map(|r| ((r.regulator.as_str(), r.target.as_str()), r.correlation))
        .collect();
    let edges = edges
        .iter()
        .filter_map(|edge| {
            lookup
                .get(&(edge.regulator.as_str(), edge.target.as_str()))
                .map(|&coor| Edge {
                    correlation: Some(coor),
                    ..edge.clone()
                })
        })
        .collect();
    Network { edges }
}

/// Pre-filter the network, correlate every remaining pair and join the
/// coefficients back onto the edges.
pub fn annotate(ex: &ExpressionMatrix, net: &Network, opts: &AnnotateOpts) -> GrnResult<Network> {
    let edges: Vec<Edge> = net
        .edges
        .iter()
        .filter(|e| e.importance >= opts.min_importance)
        .cloned()
        .collect();
    log::info!(
        "{} of {} edges have importance >= {}",
        edges.len(),
        net.edges.len(),
        opts.min_importance
    );

    let pairs: Vec<(String, String)> = edges
        .iter()
        .map(|e| (e.regulator.clone(), e.target.clone()))
        .collect();
    let results = correlate_pairs(ex, &pairs, opts)?;
    log::info!("Computed {} correlations", results.len());

    Ok(join_correlations(&edges, &results))
}
