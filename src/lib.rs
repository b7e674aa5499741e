//! # Command line interface for grnkit
//! [grnkit command line interface, subcommands, and options.](cli::Commands)
//! # README for grnkit
#![doc = include_str!("../README.md")]
/// Command line interface for grnkit.
pub mod cli;
/// RAP <-> MSU rice gene id conversion.
pub mod convert;
/// Error types shared by every stage.
pub mod error;
/// Gene expression matrices.
pub mod expression;
/// Per-regulator threshold filtering and regulon files.
pub mod grouper;
/// CisBP motif tables and Cluster-Buster input generation.
pub mod motif;
/// Module for automatically reading a writing compressed or uncompressed files.
pub mod myio;
/// TF -> target network tables.
pub mod network;
/// Spearman correlation of regulator/target expression.
pub mod spearman;
