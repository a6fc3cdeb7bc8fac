//! Renders man pages for typofix and its subcommands
//!
//! Off for debug builds; set TYPOFIX_GEN_MANPAGES to force it.

use clap::CommandFactory;
use std::env;
use std::fs::File;
use std::io::Error;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=TYPOFIX_GEN_MANPAGES");

    let release = env::var("PROFILE").map(|p| p == "release").unwrap_or(false);
    if !release && env::var_os("TYPOFIX_GEN_MANPAGES").is_none() {
        return Ok(());
    }

    let man_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target"))
        .join("man");
    std::fs::create_dir_all(&man_dir)?;

    let cli = Cli::command();
    render(&cli, "typofix", &man_dir)?;
    for sub in cli.get_subcommands().filter(|sub| sub.get_name() != "help") {
        render(sub, &format!("typofix-{}", sub.get_name()), &man_dir)?;
    }

    println!("cargo:warning=typofix man pages: {}", man_dir.display());
    Ok(())
}

/// Write `<page>.1` into `dir`
fn render(cmd: &clap::Command, page: &str, dir: &Path) -> Result<(), Error> {
    let mut out = File::create(dir.join(format!("{}.1", page)))?;
    clap_mangen::Man::new(cmd.clone()).render(&mut out)
}
