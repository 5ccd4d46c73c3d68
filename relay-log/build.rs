#![allow(missing_docs)]

use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Returns the log targets of all crates in the workspace.
///
/// Targets use the crate name with dashes replaced by underscores.
fn list_crates() -> io::Result<Vec<String>> {
    let mut crates = Vec::new();

    for (dir, prefix) in [("../", "relay"), ("../tools/", "")] {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };

        for entry in entries {
            let entry = entry?;

            if !entry.file_type()?.is_dir() {
                continue;
            }

            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    crates.push(name.replace('-', "_"));
                }
            }
        }
    }

    crates.sort();
    Ok(crates)
}

fn emit_crate_list() -> io::Result<()> {
    let crates = list_crates()?;

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.gen.rs");
    let mut f = File::create(dest_path)?;

    write!(f, "const CRATE_NAMES: &[&str] = &[")?;
    for name in &crates {
        write!(f, "\"{name}\",")?;
    }
    writeln!(f, "];")?;

    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    emit_crate_list().unwrap();
}
