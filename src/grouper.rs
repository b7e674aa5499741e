use crate::error::{GrnError, GrnResult};
use crate::network::{Group, Network};
use itertools::Itertools;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Thresholds applied to each regulator's edges, in order.
#[derive(Debug, Clone, Copy)]
pub struct GroupOpts {
    pub importance: f64,
    /// When set, a second filter on the survivors of the first.
    pub correlation: Option<f64>,
}

/// Number of targets a regulator keeps after each filtering stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCounts {
    pub regulator: String,
    pub total: usize,
    pub after_importance: usize,
    pub after_correlation: usize,
}

/// Filter one group in place: importance first, then correlation on
/// whatever the importance filter left behind.
/// # Example
/// ```
/// use grnkit::grouper::{filter_group, GroupOpts};
/// use grnkit::network::{Edge, Group};
/// let mut group = Group {
///     regulator: "TF1".to_string(),
///     edges: vec![Edge::new("TF1", "a", 0.5), Edge::new("TF1", "b", 0.01)],
/// };
/// let opts = GroupOpts { importance: 0.03, correlation: None };
/// let counts = filter_group(&mut group, &opts);
/// assert_eq!((counts.total, counts.after_importance), (2, 1));
/// assert_eq!(group.edges[0].target, "a");
/// ```
pub fn filter_group(group: &mut Group, opts: &GroupOpts) -> GroupCounts {
    let total = group.edges.len();

    group.edges.retain(|e| e.importance > opts.importance);
    let after_importance = group.edges.len();

    if let Some(threshold) = opts.correlation {
        // a missing value never passes
        group
            .edges
            .retain(|e| e.correlation.map_or(false, |c| c > threshold));
    }
    let after_correlation = group.edges.len();

    GroupCounts {
        regulator: group.regulator.clone(),
        total,
        after_importance,
        after_correlation,
    }
}

/// Group the network by regulator and filter every group.
/// Groups stay in first-seen order; emptied groups are kept.
pub fn filter_groups(net: &Network, opts: &GroupOpts) -> GrnResult<(Vec<Group>, Vec<GroupCounts>)> {
    if opts.correlation.is_some() && !net.has_correlation() {
        return Err(GrnError::MissingColumn("correlation".to_string()));
    }
    let mut groups = net.groups();
    let counts = groups
        .iter_mut()
        .map(|group| filter_group(group, opts))
        .collect();
    Ok((groups, counts))
}

/// Write `<regulator>.txt` into `dir` for every group, one target per line.
pub fn write_groups(groups: &[Group], dir: &str) -> GrnResult<usize> {
    fs::create_dir_all(dir).map_err(|e| GrnError::io(dir, e))?;
    for group in groups {
        let path = Path::new(dir).join(format!("{}.txt", group.regulator));
        let path_str = path.to_string_lossy();
        let mut out = fs::File::create(&path).map_err(|e| GrnError::io(&path_str, e))?;
        let body = group.edges.iter().map(|e| e.target.as_str()).join("\n");
        writeln!(out, "{}", body).map_err(|e| GrnError::io(&path_str, e))?;
        log::trace!("Wrote {} targets to {}", group.edges.len(), path_str);
    }
    log::info!("Wrote {} regulon files to {}", groups.len(), dir);
    Ok(groups.len())
}

/// Summary of the target counts of one filtering stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub regulators: usize,
    pub mean: f64,
    pub std: f64,
    pub min: usize,
    pub median: f64,
    pub max: usize,
}

impl StageSummary {
    /// # Example
    /// ```
    /// use grnkit::grouper::StageSummary;
    /// let s = StageSummary::new(&[1, 2, 3, 10]);
    /// assert_eq!(s.regulators, 4);
    /// assert_eq!(s.mean, 4.0);
    /// assert_eq!(s.median, 2.5);
    /// assert_eq!((s.min, s.max), (1, 10));
    /// ```
    pub fn new(counts: &[usize]) -> StageSummary {
        let n = counts.len();
        if n == 0 {
            return StageSummary {
                regulators: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: 0,
                median: f64::NAN,
                max: 0,
            };
        }
        let sorted = counts.iter().copied().sorted().collect_vec();
        let mean = sorted.iter().sum::<usize>() as f64 / n as f64;
        // population standard deviation
        let var = sorted
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };
        StageSummary {
            regulators: n,
            mean,
            std: var.sqrt(),
            min: sorted[0],
            median,
            max: sorted[n - 1],
        }
    }
}

/// Write per-regulator counts followed by `#` prefixed stage summaries.
pub fn write_counts<W: Write>(counts: &[GroupCounts], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "TF\ttotal\tIM_pass\tCoor_pass")?;
    for c in counts {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            c.regulator, c.total, c.after_importance, c.after_correlation
        )?;
    }
    writeln!(out, "#stage\tTFs\tmean\tstd\tmin\tmedian\tmax")?;
    let stages: [(&str, Vec<usize>); 3] = [
        ("total", counts.iter().map(|c| c.total).collect()),
        ("IM_pass", counts.iter().map(|c| c.after_importance).collect()),
        ("Coor_pass", counts.iter().map(|c| c.after_correlation).collect()),
    ];
    for (name, values) in stages.iter() {
        let s = StageSummary::new(values);
        writeln!(
            out,
            "#{}\t{}\t{:.2}\t{:.2}\t{}\t{:.1}\t{}",
            name, s.regulators, s.mean, s.std, s.min, s.median, s.max
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Edge;

    fn edge(tf: &str, tg: &str, im: f64, coor: f64) -> Edge {
        let mut e = Edge::new(tf, tg, im);
        e.correlation = Some(coor);
        e
    }

    #[test]
    fn test_sequential_filter_counts() {
        // 6 pass importance; of those only 3 pass correlation.
        // Two failing-importance rows have high correlation, so an
        // independent correlation filter would count 5.
        let edges = vec![
            edge("TF", "g0", 0.5, 0.9),
            edge("TF", "g1", 0.5, 0.9),
            edge("TF", "g2", 0.5, 0.9),
            edge("TF", "g3", 0.5, 0.0),
            edge("TF", "g4", 0.5, 0.0),
            edge("TF", "g5", 0.5, 0.0),
            edge("TF", "g6", 0.01, 0.9),
            edge("TF", "g7", 0.01, 0.9),
            edge("TF", "g8", 0.01, 0.0),
            edge("TF", "g9", 0.01, 0.0),
        ];
        let net = Network { edges };
        let opts = GroupOpts {
            importance: 0.03,
            correlation: Some(0.1),
        };
        let (groups, counts) = filter_groups(&net, &opts).unwrap();
        assert_eq!(
            (counts[0].total, counts[0].after_importance, counts[0].after_correlation),
            (10, 6, 3)
        );
        let kept = groups[0].edges.iter().map(|e| e.target.as_str()).collect_vec();
        assert_eq!(kept, vec!["g0", "g1", "g2"]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let net = Network {
            edges: vec![edge("A", "x", 0.03, 0.5), edge("A", "y", 0.04, 0.1)],
        };
        let opts = GroupOpts {
            importance: 0.03,
            correlation: Some(0.1),
        };
        let (_, counts) = filter_groups(&net, &opts).unwrap();
        assert_eq!(counts[0].after_importance, 1);
        assert_eq!(counts[0].after_correlation, 0);
    }

    #[test]
    fn test_correlation_column_required() {
        let net = Network {
            edges: vec![Edge::new("A", "x", 1.0)],
        };
        let opts = GroupOpts {
            importance: 0.0,
            correlation: Some(0.0),
        };
        match filter_groups(&net, &opts) {
            Err(e @ GrnError::MissingColumn(_)) => {
                assert_eq!(e.to_string(), "no correlation column on every row of the network")
            }
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_group_files_order_and_idempotence() {
        let net = Network {
            edges: vec![
                Edge::new("TF2", "a", 0.5),
                Edge::new("TF1", "b", 0.5),
                Edge::new("TF2", "c", 0.5),
                Edge::new("TF3", "d", 0.0),
                Edge::new("TF1", "e", 0.5),
            ],
        };
        let opts = GroupOpts {
            importance: 0.03,
            correlation: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("groups");
        let out = out.to_str().unwrap();

        let (groups, counts) = filter_groups(&net, &opts).unwrap();
        let order = counts.iter().map(|c| c.regulator.as_str()).collect_vec();
        assert_eq!(order, vec!["TF2", "TF1", "TF3"]);

        assert_eq!(write_groups(&groups, out).unwrap(), 3);
        let first = [
            fs::read(dir.path().join("groups/TF1.txt")).unwrap(),
            fs::read(dir.path().join("groups/TF2.txt")).unwrap(),
            fs::read(dir.path().join("groups/TF3.txt")).unwrap(),
        ];
        assert_eq!(first[0], b"b\ne\n");
        assert_eq!(first[1], b"a\nc\n");
        // emptied group still gets a file
        assert_eq!(first[2], b"\n");

        write_groups(&groups, out).unwrap();
        assert_eq!(fs::read(dir.path().join("groups/TF1.txt")).unwrap(), first[0]);
        assert_eq!(fs::read(dir.path().join("groups/TF2.txt")).unwrap(), first[1]);
        assert_eq!(fs::read(dir.path().join("groups/TF3.txt")).unwrap(), first[2]);
    }

    #[test]
    fn test_write_counts() {
        let counts = vec![
            GroupCounts {
                regulator: "TF1".into(),
                total: 10,
                after_importance: 6,
                after_correlation: 3,
            },
            GroupCounts {
                regulator: "TF2".into(),
                total: 4,
                after_importance: 2,
                after_correlation: 1,
            },
        ];
        let mut buf = Vec::new();
        write_counts(&counts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect_vec();
        assert_eq!(lines[1], "TF1\t10\t6\t3");
        assert_eq!(lines[4], "#total\t2\t7.00\t3.00\t4\t7.0\t10");
        assert_eq!(lines[6], "#Coor_pass\t2\t2.00\t1.00\t1\t2.0\t3");
    }
}
