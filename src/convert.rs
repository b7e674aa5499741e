use super::myio;
use crate::cli::Direction;
use crate::error::{GrnError, GrnResult};
use std::collections::HashMap;
use std::io::Write;

/// Placeholder used by the mapping file and for ids without a match.
pub const NONE: &str = "None";

/// Undo upper-casing of rice gene ids: `OS` becomes `Os` and every `G`
/// becomes `g`.
/// # Example
/// ```
/// use grnkit::convert::fix_rap_case;
/// assert_eq!(fix_rap_case("OS01G0100100"), "Os01g0100100");
/// assert_eq!(fix_rap_case("Os01g0100100"), "Os01g0100100");
/// assert_eq!(fix_rap_case("LOC_OS01G01010"), "LOC_Os01g01010");
/// ```
pub fn fix_rap_case(id: &str) -> String {
    id.replace("OS", "Os").replace('G', "g")
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// RAP <-> MSU gene id relations. Lists are deduplicated and keep the order
/// they were first seen in the mapping file.
#[derive(Debug, Default)]
pub struct IdMap {
    pub rap_to_msu: HashMap<String, Vec<String>>,
    pub msu_to_rap: HashMap<String, Vec<String>>,
}

impl IdMap {
    /// Build the relations from `rap\tmsu[,msu...]` lines.
    /// # Example
    /// ```
    /// use grnkit::cli::Direction;
    /// use grnkit::convert::IdMap;
    /// let map = IdMap::from_lines(["TF1\tG1,G2", "TF2\tNone"], "-").unwrap();
    /// assert_eq!(map.convert("TF1", Direction::Rap2msu), "G1,G2");
    /// assert_eq!(map.convert("TF2", Direction::Rap2msu), "None");
    /// assert_eq!(map.convert("G3", Direction::Rap2msu), "None");
    /// assert_eq!(map.convert("G2", Direction::Msu2rap), "TF1");
    /// ```
    pub fn from_lines<I, S>(lines: I, path: &str) -> GrnResult<IdMap>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = IdMap::default();
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let t: Vec<&str> = line.split('\t').collect();
            if t.len() != 2 {
                return Err(GrnError::malformed(
                    path,
                    index + 1,
                    format!("expected 2 tab separated columns, found {}", t.len()),
                ));
            }
            let (rap, msu) = (t[0], t[1]);

            let mut msu_genes = Vec::new();
            if msu == NONE {
                msu_genes.push(NONE.to_string());
            } else {
                // transcript ids carry a `.N` suffix
                for transcript in msu.split(',') {
                    let gene = transcript.split('.').next().unwrap_or(transcript);
                    if !gene.is_empty() {
                        push_unique(&mut msu_genes, gene);
                    }
                }
            }

            for gene in msu_genes.iter().filter(|g| *g != NONE) {
                push_unique(map.msu_to_rap.entry(gene.clone()).or_default(), rap);
            }
            map.rap_to_msu.insert(rap.to_string(), msu_genes);
        }
        log::info!(
            "Loaded {} RAP and {} MSU gene ids from {}",
            map.rap_to_msu.len(),
            map.msu_to_rap.len(),
            path
        );
        Ok(map)
    }

    pub fn from_file(file_name: &str) -> GrnResult<IdMap> {
        IdMap::from_lines(myio::read_lines(file_name)?, file_name)
    }

    fn relation(&self, direction: Direction) -> &HashMap<String, Vec<String>> {
        match direction {
            Direction::Rap2msu => &self.rap_to_msu,
            Direction::Msu2rap => &self.msu_to_rap,
        }
    }

    /// Comma joined ids for `id`, or `None` when it is not in the map.
    pub fn convert(&self, id: &str, direction: Direction) -> String {
        match self.relation(direction).get(id) {
            Some(ids) => ids.join(","),
            None => NONE.to_string(),
        }
    }
}

/// Convert every line of `input`, writing `query\tresult` in input order.
pub fn convert_file(
    map: &IdMap,
    input: &str,
    output: &str,
    direction: Direction,
    fix_case: bool,
) -> GrnResult<usize> {
    let lines = myio::read_lines(input)?;
    let mut out = myio::writer(output)?;
    let mut n_missing = 0;
    for line in &lines {
        let query = line.trim();
        let query = if fix_case {
            fix_rap_case(query)
        } else {
            query.to_string()
        };
        let result = map.convert(&query, direction);
        if result == NONE {
            n_missing += 1;
        }
        writeln!(out, "{}\t{}", query, result).map_err(|e| GrnError::io(output, e))?;
    }
    out.flush().map_err(|e| GrnError::io(output, e))?;
    log::info!(
        "Converted {} ids ({} without a match) into {}",
        lines.len(),
        n_missing,
        output
    );
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn three_way_map() -> IdMap {
        IdMap::from_lines(
            [
                "Os01g0100100\tLOC_Os01g01010.1",
                "Os01g0100200\tLOC_Os01g01019.1,LOC_Os01g01019.2,LOC_Os01g01030.1",
                "Os01g0100300\tNone",
            ],
            "-",
        )
        .unwrap()
    }

    #[test]
    fn test_transcripts_collapse_to_genes() {
        let map = three_way_map();
        assert_eq!(
            map.convert("Os01g0100200", Direction::Rap2msu),
            "LOC_Os01g01019,LOC_Os01g01030"
        );
        assert_eq!(map.convert("Os01g0100100", Direction::Rap2msu), "LOC_Os01g01010");
        assert_eq!(map.convert("Os01g0100300", Direction::Rap2msu), "None");
    }

    #[test]
    fn test_round_trip_recovers_rap_id() {
        let map = three_way_map();
        for rap in ["Os01g0100100", "Os01g0100200"] {
            let msu = map.convert(rap, Direction::Rap2msu);
            for gene in msu.split(',') {
                let back = map.convert(gene, Direction::Msu2rap);
                assert!(back.split(',').any(|r| r == rap), "{} -> {} -> {}", rap, gene, back);
            }
        }
        // None never becomes a reverse key
        assert_eq!(map.convert("None", Direction::Msu2rap), "None");
    }

    #[test]
    fn test_round_trip_from_file() {
        let map = IdMap::from_file(".test/RAP-MSU_small.txt").unwrap();
        assert_eq!(map.rap_to_msu.len(), 3);
        let msu = map.convert("Os01g0100200", Direction::Rap2msu);
        assert_eq!(msu, "LOC_Os01g01019,LOC_Os01g01030");
        assert_eq!(map.convert("LOC_Os01g01030", Direction::Msu2rap), "Os01g0100200");
    }

    #[test]
    fn test_many_to_many() {
        let map = IdMap::from_lines(["R1\tM1.1", "R2\tM1.2,M2.1"], "-").unwrap();
        assert_eq!(map.convert("M1", Direction::Msu2rap), "R1,R2");
    }

    #[test]
    fn test_bad_mapping_line() {
        assert!(IdMap::from_lines(["R1\tM1\textra"], "-").is_err());
    }

    #[test]
    fn test_convert_file_keeps_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ids.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "TF2\nG3\nTF1\n").unwrap();
        let map = IdMap::from_lines(["TF1\tG1,G2", "TF2\tNone"], "-").unwrap();
        let n = convert_file(
            &map,
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            Direction::Rap2msu,
            false,
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "TF2\tNone\nG3\tNone\nTF1\tG1,G2\n"
        );
    }

    #[test]
    fn test_convert_file_fix_case() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ids.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "OS01G0100100\n").unwrap();
        convert_file(
            &three_way_map(),
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            Direction::Rap2msu,
            true,
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Os01g0100100\tLOC_Os01g01010\n"
        );
    }
}
