//! Development tasks for typofix
//!
//! Usage:
//!   cargo xtask install     Install release binary to /usr/local/bin (requires sudo)
//!   cargo xtask uninstall   Remove binary from /usr/local/bin (requires sudo)
//!   cargo xtask man         Build and print the location of the man pages
//!   cargo xtask doctor      Check that the runtime tools are installed

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

const BINARY: &str = "typofix";
const INSTALL_PATH: &str = "/usr/local/bin/typofix";

/// External programs typofix shells out to at runtime
const RUNTIME_TOOLS: [(&str, &str); 5] = [
    ("ydotool", "key simulation (copy/paste)"),
    ("zenity", "confirmation and config dialogs"),
    ("wl-copy", "clipboard on Wayland (wl-clipboard)"),
    ("xclip", "clipboard on X11"),
    ("notify-send", "desktop notifications (libnotify)"),
];

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(command) = args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let result = match command.as_str() {
        "install" => install(),
        "uninstall" => uninstall(),
        "man" => man(),
        "doctor" => doctor(),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
            Err(anyhow::anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        r#"
typofix development tasks

Usage: cargo xtask <COMMAND>

Commands:
  install    Build release binary and install to /usr/local/bin (requires sudo)
  uninstall  Remove typofix from /usr/local/bin (requires sudo)
  man        Build man pages from the CLI definition
  doctor     Check that ydotool, zenity and the clipboard tools are installed
"#
    );
}

/// Get the project root directory
fn project_root() -> anyhow::Result<PathBuf> {
    let dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir()?,
    };

    // xtask is in a subdirectory, go up one level
    Ok(dir.parent().unwrap_or(&dir).to_path_buf())
}

fn cargo_release(root: &Path, envs: &[(&str, &str)]) -> anyhow::Result<()> {
    let status = Command::new("cargo")
        .args(["build", "--release"])
        .envs(envs.iter().copied())
        .current_dir(root)
        .status()?;

    if !status.success() {
        anyhow::bail!("Build failed");
    }
    Ok(())
}

/// Build release binary and install to /usr/local/bin
fn install() -> anyhow::Result<()> {
    let root = project_root()?;

    println!("==> Building release binary...");
    cargo_release(&root, &[])?;

    let binary = root.join("target/release").join(BINARY);
    if !binary.exists() {
        anyhow::bail!("Binary not found at {:?}", binary);
    }

    println!("==> Installing to {}...", INSTALL_PATH);

    let status = Command::new("sudo")
        .arg("install")
        .arg("-Dm755")
        .arg(&binary)
        .arg(INSTALL_PATH)
        .status()?;

    if !status.success() {
        anyhow::bail!("Install failed (sudo required)");
    }

    println!("==> Installed successfully!");
    println!();

    // Show version
    let _ = Command::new(INSTALL_PATH).arg("--version").status();

    Ok(())
}

/// Remove typofix from /usr/local/bin
fn uninstall() -> anyhow::Result<()> {
    println!("==> Removing {}...", INSTALL_PATH);

    let status = Command::new("sudo")
        .args(["rm", "-f", INSTALL_PATH])
        .status()?;

    if !status.success() {
        anyhow::bail!("Uninstall failed (sudo required)");
    }

    println!("==> Uninstalled successfully!");
    Ok(())
}

/// Build with man page generation enabled; build.rs reports the directory
fn man() -> anyhow::Result<()> {
    let root = project_root()?;
    println!("==> Generating man pages...");
    cargo_release(&root, &[("TYPOFIX_GEN_MANPAGES", "1")])
}

/// Report which runtime tools are missing
fn doctor() -> anyhow::Result<()> {
    let mut found = Vec::new();

    for (tool, purpose) in RUNTIME_TOOLS {
        let present = Command::new("which")
            .arg(tool)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);

        if present {
            println!("  [ok]      {:<12} {}", tool, purpose);
            found.push(tool);
        } else {
            println!("  [missing] {:<12} {}", tool, purpose);
        }
    }

    let in_input_group = Command::new("id")
        .arg("-nG")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).split_whitespace().any(|g| g == "input"))
        .unwrap_or(false);
    if !in_input_group {
        println!("\nNot in the 'input' group; hotkeys need: sudo usermod -aG input $USER");
    }

    // Only one of the clipboard tools is needed
    let has = |tool: &str| found.iter().any(|t| *t == tool);
    let usable = has("ydotool") && has("zenity") && (has("wl-copy") || has("xclip"));
    if !usable || !in_input_group {
        anyhow::bail!("Some runtime requirements are missing");
    }
    Ok(())
}
