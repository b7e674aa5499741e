// Generate shell completions for grnkit into OUT_DIR.
use clap_complete::{
    generate_to,
    shells::{Bash, Zsh},
};
use std::env;
use std::io;

#[allow(dead_code)]
mod cli {
    include!("src/cli.rs");
}

fn main() -> Result<(), io::Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    let out_dir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(out_dir) => out_dir,
    };

    let mut app = cli::make_cli_app();
    for bin in ["grnkit", "gk"] {
        generate_to(Bash, &mut app, bin, &out_dir)?;
        generate_to(Zsh, &mut app, bin, &out_dir)?;
    }
    Ok(())
}
