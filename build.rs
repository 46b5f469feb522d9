//! Build script rendering the manual pages of `devpod-provider-hetzner`.
//!
//! One page covers the binary and one page each covers its subcommands. All
//! pages land in the build output directory for packaging.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir =
        PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
        })?);

    let command = Cli::command();
    let binary = command.get_name().to_owned();
    write_page(&out_dir, &binary, Man::new(command.clone()))?;

    for subcommand in command.get_subcommands() {
        let page_name = format!("{binary}-{}", subcommand.get_name());
        let page = Man::new(subcommand.clone()).title(page_name.clone());
        write_page(&out_dir, &page_name, page)?;
    }

    Ok(())
}

fn write_page(out_dir: &Path, name: &str, page: Man) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    page.render(&mut buffer)?;
    fs::write(out_dir.join(format!("{name}.1")), buffer)
}
