use super::myio;
use crate::error::{GrnError, GrnResult};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub regulator: String,
    pub target: String,
    pub importance: f64,
    pub correlation: Option<f64>,
}

impl Edge {
    pub fn new(regulator: &str, target: &str, importance: f64) -> Edge {
        Edge {
            regulator: regulator.to_string(),
            target: target.to_string(),
            importance,
            correlation: None,
        }
    }

    /// Parse one tab separated network line.
    /// # Example
    /// ```
    /// use grnkit::network::Edge;
    /// let edge = Edge::from_line("TF1\tG1\t0.5\t-0.25", "-", 1).unwrap();
    /// assert_eq!(edge.regulator, "TF1");
    /// assert_eq!(edge.target, "G1");
    /// assert_eq!(edge.importance, 0.5);
    /// assert_eq!(edge.correlation, Some(-0.25));
    ///
    /// assert!(Edge::from_line("TF1\tG1", "-", 1).is_err());
    /// assert!(Edge::from_line("TF1\tG1\thigh", "-", 1).is_err());
    /// ```
    pub fn from_line(line: &str, path: &str, line_no: usize) -> GrnResult<Edge> {
        let t: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if t.len() != 3 && t.len() != 4 {
            return Err(GrnError::malformed(
                path,
                line_no,
                format!("expected 3 or 4 tab separated columns, found {}", t.len()),
            ));
        }
        let parse = |s: &str, what: &str| {
            s.trim().parse::<f64>().map_err(|_| {
                GrnError::malformed(path, line_no, format!("{} is not a number: {:?}", what, s))
            })
        };
        let mut edge = Edge::new(t[0], t[1], parse(t[2], "importance")?);
        if t.len() == 4 {
            edge.correlation = Some(parse(t[3], "correlation")?);
        }
        Ok(edge)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.regulator, self.target, self.importance)?;
        if let Some(coor) = self.correlation {
            write!(f, "\t{}", coor)?;
        }
        Ok(())
    }
}

/// The edges of one regulator, kept in input order.
#[derive(Debug, Clone)]
pub struct Group {
    pub regulator: String,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Default)]
pub struct Network {
    pub edges: Vec<Edge>,
}

impl Network {
    /// Read a network table, pass "-" for stdin.
    ///
    /// The first non-comment line is skipped when it is a known header
    /// (`TF TG IM`, `regulator target importance`, ...). Any other line
    /// must parse as an edge.
    /// # Example
    /// ```
    /// use grnkit::network::Network;
    /// let net = Network::from_file(".test/net_small.tsv").unwrap();
    /// assert_eq!(net.edges.len(), 5);
    /// assert!(net.has_correlation());
    /// ```
    pub fn from_file(file_name: &str) -> GrnResult<Network> {
        let mut net = Network::default();
        let mut first = true;
        for (index, line) in myio::read_lines(file_name)?.iter().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if std::mem::take(&mut first) && is_header(line) {
                log::debug!("Skipping header of {}: {}", file_name, line);
                continue;
            }
            net.edges.push(Edge::from_line(line, file_name, index + 1)?);
        }
        log::info!("Read {} edges from {}", net.edges.len(), file_name);
        Ok(net)
    }

    /// True when every edge carries a correlation value.
    pub fn has_correlation(&self) -> bool {
        self.edges.iter().all(|e| e.correlation.is_some())
    }

    /// Split edges by regulator. Groups come out in the order each
    /// regulator is first seen, not sorted.
    /// # Example
    /// ```
    /// use grnkit::network::{Edge, Network};
    /// let net = Network {
    ///     edges: vec![
    ///         Edge::new("B", "g1", 1.0),
    ///         Edge::new("A", "g2", 1.0),
    ///         Edge::new("B", "g3", 1.0),
    ///     ],
    /// };
    /// let groups = net.groups();
    /// assert_eq!(groups[0].regulator, "B");
    /// assert_eq!(groups[0].edges.len(), 2);
    /// assert_eq!(groups[1].regulator, "A");
    /// ```
    pub fn groups(&self) -> Vec<Group> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for edge in &self.edges {
            let idx = *index.entry(edge.regulator.as_str()).or_insert_with(|| {
                groups.push(Group {
                    regulator: edge.regulator.clone(),
                    edges: Vec::new(),
                });
                groups.len() - 1
            });
            groups[idx].edges.push(edge.clone());
        }
        groups
    }

    /// Write the table with a `TF TG IM [Coor]` header.
    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.has_correlation() && !self.edges.is_empty() {
            writeln!(out, "TF\tTG\tIM\tCoor")?;
        } else {
            writeln!(out, "TF\tTG\tIM")?;
        }
        for edge in &self.edges {
            writeln!(out, "{}", edge)?;
        }
        Ok(())
    }
}

const IMPORTANCE_HEADERS: [&str; 4] = ["im", "importance", "weight", "corr"];
const PAIR_HEADERS: [(&str, &str); 4] = [
    ("tf", "tg"),
    ("tf", "target"),
    ("regulator", "target"),
    ("genea", "geneb"),
];

fn is_header(line: &str) -> bool {
    let t: Vec<String> = line
        .split('\t')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    if t.len() < 3 {
        return false;
    }
    IMPORTANCE_HEADERS.contains(&t[2].as_str())
        || PAIR_HEADERS.contains(&(t[0].as_str(), t[1].as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_header_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let with = dir.path().join("with.tsv");
        let without = dir.path().join("without.tsv");
        fs::write(&with, "TF\tTG\tIM\nA\tx\t0.1\nA\ty\t0.2\n").unwrap();
        fs::write(&without, "A\tx\t0.1\nA\ty\t0.2\n").unwrap();

        let a = Network::from_file(with.to_str().unwrap()).unwrap();
        let b = Network::from_file(without.to_str().unwrap()).unwrap();
        assert_eq!(a.edges, b.edges);
        assert!(!a.has_correlation());
    }

    #[test]
    fn test_bad_first_row_is_not_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        fs::write(&path, "A\tx\thigh\nA\ty\t0.2\n").unwrap();
        match Network::from_file(path.to_str().unwrap()) {
            Err(GrnError::Malformed { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_after_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.tsv");
        fs::write(&path, "# from grnboost2\n\nTF\tTG\tIM\nA\tx\t0.1\n").unwrap();
        let net = Network::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(net.edges, vec![Edge::new("A", "x", 0.1)]);
    }

    #[test]
    fn test_known_headers() {
        assert!(is_header("TF\tTG\tIM\tCoor"));
        assert!(is_header("regulator\ttarget\timportance"));
        assert!(is_header("GeneA\tGeneB\tCorr"));
        assert!(!is_header("A\tx\thigh"));
        assert!(!is_header("A\tx\t0.1"));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        fs::write(&path, "A\tx\t0.1\nA\ty\n").unwrap();
        match Network::from_file(path.to_str().unwrap()) {
            Err(GrnError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Network::from_file("no/such/net.tsv"),
            Err(GrnError::MissingFile(_))
        ));
    }

    #[test]
    fn test_write_round_trips() {
        let mut edge = Edge::new("A", "x", 0.5);
        edge.correlation = Some(0.25);
        let net = Network { edges: vec![edge] };
        let mut buf = Vec::new();
        net.write(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "TF\tTG\tIM\tCoor\nA\tx\t0.5\t0.25\n");
    }
}
