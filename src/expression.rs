use super::myio;
use crate::error::{GrnError, GrnResult};
use std::collections::HashMap;

/// Genes by samples expression values, keyed on gene id.
#[derive(Debug, Default)]
pub struct ExpressionMatrix {
    pub samples: Vec<String>,
    pub genes: HashMap<String, Vec<f64>>,
}

impl ExpressionMatrix {
    /// Read a delimited matrix: a header naming the samples, then one row
    /// per gene with the gene id in the first column.
    /// # Example
    /// ```
    /// use grnkit::expression::ExpressionMatrix;
    /// let ex = ExpressionMatrix::from_file(".test/expr_small.csv", b',').unwrap();
    /// assert_eq!(ex.samples.len(), 5);
    /// assert_eq!(ex.genes.len(), 4);
    /// assert_eq!(ex.get("TF1").unwrap()[0], 1.0);
    /// ```
    pub fn from_file(file_name: &str, delimiter: u8) -> GrnResult<ExpressionMatrix> {
        let reader = myio::reader(file_name)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| GrnError::malformed(file_name, 1, e.to_string()))?;
        // first header cell labels the gene column
        let samples: Vec<String> = headers.iter().skip(1).map(String::from).collect();

        let mut genes = HashMap::new();
        for (index, rec) in csv_reader.records().enumerate() {
            let line = index + 2;
            let rec = rec.map_err(|e| GrnError::malformed(file_name, line, e.to_string()))?;
            let mut fields = rec.iter();
            let gene = match fields.next() {
                Some(g) if !g.is_empty() => g.to_string(),
                _ => return Err(GrnError::malformed(file_name, line, "missing gene id")),
            };
            let values = fields
                .map(|v| match v.trim().parse::<f64>() {
                    Ok(x) if x.is_finite() => Ok(x),
                    _ => Err(GrnError::malformed(
                        file_name,
                        line,
                        format!("non-numeric expression value {:?} for {}", v, gene),
                    )),
                })
                .collect::<GrnResult<Vec<f64>>>()?;
            if values.len() != samples.len() {
                return Err(GrnError::malformed(
                    file_name,
                    line,
                    format!(
                        "{} has {} values but the header names {} samples",
                        gene,
                        values.len(),
                        samples.len()
                    ),
                ));
            }
            if genes.insert(gene.clone(), values).is_some() {
                return Err(GrnError::malformed(
                    file_name,
                    line,
                    format!("duplicate gene {}", gene),
                ));
            }
        }
        log::info!(
            "Loaded expression matrix: {} genes x {} samples.",
            genes.len(),
            samples.len()
        );
        Ok(ExpressionMatrix { samples, genes })
    }

    pub fn get(&self, gene: &str) -> Option<&[f64]> {
        self.genes.get(gene).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_tab_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ex.tsv");
        fs::write(&path, "gene\ts1\ts2\nA\t1\t2\nB\t3.5\t4\n").unwrap();
        let ex = ExpressionMatrix::from_file(path.to_str().unwrap(), b'\t').unwrap();
        assert_eq!(ex.samples, vec!["s1", "s2"]);
        assert_eq!(ex.get("B"), Some(&[3.5, 4.0][..]));
        assert_eq!(ex.get("C"), None);
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ex.csv");
        fs::write(&path, ",s1,s2\nA,1,2\nB,3\n").unwrap();
        match ExpressionMatrix::from_file(path.to_str().unwrap(), b',') {
            Err(GrnError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ex.csv");
        fs::write(&path, ",s1\nA,x\n").unwrap();
        assert!(ExpressionMatrix::from_file(path.to_str().unwrap(), b',').is_err());
        fs::write(&path, ",s1\nA,1\nA,2\n").unwrap();
        assert!(ExpressionMatrix::from_file(path.to_str().unwrap(), b',').is_err());
    }

    #[test]
    fn test_nan_and_inf_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ex.csv");
        for bad in ["nan", "NaN", "inf", "-inf"] {
            fs::write(&path, format!(",s1,s2,s3,s4\nA,1,2,{},4\nB,1,2,3,4\n", bad)).unwrap();
            match ExpressionMatrix::from_file(path.to_str().unwrap(), b',') {
                Err(GrnError::Malformed { line, .. }) => assert_eq!(line, 2),
                other => panic!("expected malformed error for {}, got {:?}", bad, other),
            }
        }
    }
}
