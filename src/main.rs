use anyhow::Context;
use colored::Colorize;
use env_logger::{Builder, Target};
use grnkit::cli::Commands;
use grnkit::*;
use log::LevelFilter;
use num_format::{Locale, ToFormattedString};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    parse_cli()
}

pub fn parse_cli() -> anyhow::Result<()> {
    let pg_start = Instant::now();
    let args = cli::make_cli_parse();

    // set the logging level
    let min_log_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .target(Target::Stderr)
        .filter(None, min_log_level)
        .init();

    log::debug!("DEBUG logging enabled");
    log::trace!("TRACE logging enabled");

    let command = match &args.command {
        Some(command) => command,
        None => return Ok(()),
    };

    match command {
        //
        // Run Spearman
        //
        Commands::Spearman {
            expression,
            network,
            output,
            delimiter,
            min_importance,
            on_missing,
            pairs_only,
        } => {
            let ex = expression::ExpressionMatrix::from_file(expression, *delimiter)
                .with_context(|| format!("Failed to load expression matrix {}", expression))?;
            let net = network::Network::from_file(network)
                .with_context(|| format!("Failed to load network {}", network))?;
            let opts = spearman::AnnotateOpts {
                threads: args.threads,
                min_importance: *min_importance,
                on_missing: *on_missing,
            };
            let annotated = spearman::annotate(&ex, &net, &opts)?;
            log::info!(
                "Calculation done, saving {} edges to {}",
                annotated.edges.len().to_formatted_string(&Locale::en),
                output
            );

            let mut out = myio::writer(output)?;
            if *pairs_only {
                writeln!(out, "TF\tTG\tCoor")?;
                for edge in &annotated.edges {
                    writeln!(
                        out,
                        "{}\t{}\t{}",
                        edge.regulator,
                        edge.target,
                        edge.correlation.unwrap_or(f64::NAN)
                    )?;
                }
            } else {
                annotated.write(&mut out)?;
            }
            out.flush()?;
        }
        //
        // Run Group
        //
        Commands::Group {
            network,
            threshold,
            correlation,
            dest_dir,
        } => {
            let net = network::Network::from_file(network)
                .with_context(|| format!("Failed to load network {}", network))?;
            let opts = grouper::GroupOpts {
                importance: *threshold,
                correlation: *correlation,
            };
            let (groups, _counts) = grouper::filter_groups(&net, &opts)
                .with_context(|| format!("Failed to filter {}", network))?;
            let n = grouper::write_groups(&groups, dest_dir)?;
            log::info!(
                "{} regulators written to {}",
                n.to_formatted_string(&Locale::en),
                dest_dir
            );
        }
        //
        // Run FilterStats
        //
        Commands::FilterStats {
            network,
            im,
            coor,
            dest_dir,
        } => {
            let net = network::Network::from_file(network)
                .with_context(|| format!("Failed to load network {}", network))?;
            let opts = grouper::GroupOpts {
                importance: *im,
                correlation: Some(*coor),
            };
            let (groups, counts) = grouper::filter_groups(&net, &opts)
                .with_context(|| format!("Failed to filter {}", network))?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            grouper::write_counts(&counts, &mut out)?;
            if let Some(dir) = dest_dir {
                grouper::write_groups(&groups, dir)?;
            }
        }
        //
        // Run ConvertId
        //
        Commands::ConvertId {
            direction,
            map_file,
            input_file,
            output,
            fix_case,
        } => {
            let map = convert::IdMap::from_file(map_file)
                .with_context(|| format!("Failed to load id mapping {}", map_file))?;
            let output = output
                .clone()
                .unwrap_or_else(|| format!("gid_{}.txt", direction));
            convert::convert_file(&map, input_file, &output, *direction, *fix_case)?;
        }
        //
        // Run Tf2motif
        //
        Commands::Tf2motif { tf_info, output } => {
            let tf_motifs = motif::tf_motifs_from_cisbp(tf_info)?;
            motif::write_tf_motifs(&tf_motifs, output)?;
        }
        //
        // Run CbustPrep
        //
        Commands::CbustPrep {
            promoter_file,
            tf2motif_file,
            regulon_dir,
            pwm_dir,
            seq_dir,
            motif_dir,
        } => {
            let promoters = motif::read_promoters(promoter_file)?;
            let tf_motifs = motif::read_tf_motifs(tf2motif_file)?;
            let dirs = motif::MotifDirs {
                regulon_dir: PathBuf::from(regulon_dir),
                pwm_dir: PathBuf::from(pwm_dir),
                seq_dir: PathBuf::from(seq_dir),
                motif_dir: PathBuf::from(motif_dir),
            };
            motif::cbust_prep(&tf_motifs, &promoters, &dirs)?;
        }
    };

    let duration = pg_start.elapsed();
    log::info!(
        "{} done! Time elapsed: {}",
        command.name().bright_green().bold(),
        format!("{:.2?}", duration).bright_yellow().bold()
    );
    Ok(())
}
