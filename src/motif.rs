use super::myio;
use crate::convert::fix_rap_case;
use crate::error::{GrnError, GrnResult};
use itertools::Itertools;
use needletail::parse_fastx_file;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Id prefixes of rice TFs in the CisBP tables (MSU and RAP).
const RICE_PREFIXES: [&str; 2] = ["LOC", "OS"];

/// Motif ids of each TF, in the order TFs were first seen.
pub type TfMotifs = Vec<(String, Vec<String>)>;

fn column(headers: &csv::StringRecord, name: &str, path: &str) -> GrnResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| GrnError::malformed(path, 1, format!("no {} column in header", name)))
}

/// Collect the motif ids of rice TFs from a CisBP TF information table.
///
/// Rows without a motif (`.`) are dropped and motif ids are cut at their
/// first `_`, so `M0001_2.00` becomes `M0001`. TFs come out sorted by
/// DBID, motifs of one TF in table order.
pub fn tf_motifs_from_cisbp(file_name: &str) -> GrnResult<TfMotifs> {
    let reader = myio::reader(file_name)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| GrnError::malformed(file_name, 1, e.to_string()))?
        .clone();
    let dbid_col = column(&headers, "DBID", file_name)?;
    let motif_col = column(&headers, "Motif_ID", file_name)?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tf_motifs: TfMotifs = Vec::new();
    for (i, rec) in csv_reader.records().enumerate() {
        let line = i + 2;
        let rec = rec.map_err(|e| GrnError::malformed(file_name, line, e.to_string()))?;
        let (dbid, motif) = match (rec.get(dbid_col), rec.get(motif_col)) {
            (Some(d), Some(m)) => (d, m),
            _ => return Err(GrnError::malformed(file_name, line, "row is missing columns")),
        };
        if !RICE_PREFIXES.iter().any(|p| dbid.starts_with(p)) || motif == "." {
            continue;
        }
        let motif = motif.split('_').next().unwrap_or(motif).to_string();
        let idx = *index.entry(dbid.to_string()).or_insert_with(|| {
            tf_motifs.push((dbid.to_string(), Vec::new()));
            tf_motifs.len() - 1
        });
        tf_motifs[idx].1.push(motif);
    }
    log::info!("Found motifs for {} TFs in {}", tf_motifs.len(), file_name);
    Ok(tf_motifs
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect())
}

/// Write `TF\tmotif,motif,...` lines. Nothing is written for an empty table.
pub fn write_tf_motifs(tf_motifs: &TfMotifs, output: &str) -> GrnResult<()> {
    if tf_motifs.is_empty() {
        log::warn!("No TF has a motif, {} not written", output);
        return Ok(());
    }
    let mut out = myio::writer(output)?;
    for (tf, motifs) in tf_motifs {
        writeln!(out, "{}\t{}", tf, motifs.join(",")).map_err(|e| GrnError::io(output, e))?;
    }
    out.flush().map_err(|e| GrnError::io(output, e))
}

/// Read a `TF\tmotif,motif,...` table.
pub fn read_tf_motifs(file_name: &str) -> GrnResult<TfMotifs> {
    let mut tf_motifs = Vec::new();
    for (index, line) in myio::read_lines(file_name)?.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (tf, motifs) = line.trim_end().split_once('\t').ok_or_else(|| {
            GrnError::malformed(file_name, index + 1, "expected TF<tab>motif list")
        })?;
        let motifs = motifs
            .split(',')
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        tf_motifs.push((tf.to_string(), motifs));
    }
    Ok(tf_motifs)
}

/// Promoter sequences keyed on the record id (header up to the first space).
pub fn read_promoters(file_name: &str) -> GrnResult<HashMap<String, Vec<u8>>> {
    if !Path::new(file_name).exists() {
        return Err(GrnError::MissingFile(file_name.to_string()));
    }
    let mut reader = parse_fastx_file(file_name)
        .map_err(|e| GrnError::malformed(file_name, 0, e.to_string()))?;
    let mut promoters = HashMap::new();
    let mut rec_num = 0;
    while let Some(record) = reader.next() {
        rec_num += 1;
        let rec = record.map_err(|e| {
            GrnError::malformed(file_name, 0, format!("record {}: {}", rec_num, e))
        })?;
        let header = String::from_utf8_lossy(rec.id());
        let id = header.split(' ').next().unwrap_or_default().to_string();
        promoters.insert(id, rec.seq().into_owned());
    }
    log::info!("Read {} promoter sequences from {}", promoters.len(), file_name);
    Ok(promoters)
}

/// Where the scanner inputs are read from and written to.
#[derive(Debug, Clone)]
pub struct MotifDirs {
    pub regulon_dir: PathBuf,
    pub pwm_dir: PathBuf,
    pub seq_dir: PathBuf,
    pub motif_dir: PathBuf,
}

fn write_promoter_fasta(
    tf: &str,
    promoters: &HashMap<String, Vec<u8>>,
    dirs: &MotifDirs,
) -> GrnResult<bool> {
    let regulon = dirs.regulon_dir.join(format!("{}.txt", tf));
    if !regulon.exists() {
        log::warn!("{} does not exist", regulon.display());
        return Ok(false);
    }
    let regulon_str = regulon.to_string_lossy();
    let genes = myio::read_lines(&regulon_str)?
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| fix_rap_case(g))
        .collect_vec();

    let records = genes
        .iter()
        .filter_map(|gene| promoters.get(gene).map(|seq| (gene, seq)))
        .collect_vec();
    if records.is_empty() {
        return Ok(false);
    }

    let path = dirs.seq_dir.join(format!("{}.fa", tf));
    let path_str = path.to_string_lossy();
    let mut out = myio::writer(&path_str)?;
    for (gene, seq) in records {
        writeln!(out, ">{}", gene).map_err(|e| GrnError::io(&path_str, e))?;
        out.write_all(seq).map_err(|e| GrnError::io(&path_str, e))?;
        writeln!(out).map_err(|e| GrnError::io(&path_str, e))?;
    }
    out.flush().map_err(|e| GrnError::io(&path_str, e))?;
    Ok(true)
}

/// Concatenate the non-blank lines of each motif's PWM file, in order.
fn write_motif_bundle(tf: &str, motifs: &[String], dirs: &MotifDirs) -> GrnResult<()> {
    let mut lines = Vec::new();
    for motif in motifs {
        let pwm = dirs.pwm_dir.join(format!("{}.txt", motif));
        let pwm_lines = myio::read_lines(&pwm.to_string_lossy())?;
        lines.extend(pwm_lines.into_iter().filter(|l| !l.trim().is_empty()));
    }
    let path = dirs.motif_dir.join(format!("{}.cb", tf));
    let path_str = path.to_string_lossy();
    let mut out = myio::writer(&path_str)?;
    for line in lines {
        writeln!(out, "{}", line).map_err(|e| GrnError::io(&path_str, e))?;
    }
    out.flush().map_err(|e| GrnError::io(&path_str, e))
}

/// Build the per-TF sequence and motif files for the motif scanner.
/// Returns the number of TFs that got both files.
pub fn cbust_prep(
    tf_motifs: &TfMotifs,
    promoters: &HashMap<String, Vec<u8>>,
    dirs: &MotifDirs,
) -> GrnResult<usize> {
    for dir in [&dirs.seq_dir, &dirs.motif_dir] {
        fs::create_dir_all(dir).map_err(|e| GrnError::io(&dir.to_string_lossy(), e))?;
    }
    let mut n_done = 0;
    for (tf, motifs) in tf_motifs {
        if write_promoter_fasta(tf, promoters, dirs)? {
            write_motif_bundle(tf, motifs, dirs)?;
            n_done += 1;
        } else {
            log::info!("No sequences generated for {}", tf);
        }
    }
    log::info!(
        "Generated scanner inputs for {} of {} TFs",
        n_done,
        tf_motifs.len()
    );
    Ok(n_done)
}
