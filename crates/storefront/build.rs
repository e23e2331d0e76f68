//! Build script for the storefront crate.
//!
//! Fingerprints static assets (stylesheet and the small HTMX glue script)
//! so templates can reference immutable, cache-forever URLs.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets to fingerprint: (path under `static/`, env var, derived dir, stem, extension).
const ASSETS: &[(&str, &str, &str, &str, &str)] = &[
    ("css/main.css", "CSS_HASH", "css/derived", "main", "css"),
    ("js/app.js", "JS_HASH", "js/derived", "app", "js"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    for (source, env_var, derived, stem, ext) in ASSETS {
        hash_asset(&static_dir, source, env_var, derived, stem, ext);
    }
}

/// Hash one asset and copy it next to the original with the hash in its name.
///
/// Sets `env_var` for use with `env!(...)`. A missing asset yields an empty
/// hash so a fresh checkout still builds.
fn hash_asset(static_dir: &Path, source: &str, env_var: &str, derived: &str, stem: &str, ext: &str) {
    let source_path = static_dir.join(source);
    println!("cargo:rerun-if-changed={}", source_path.display());

    let content = match fs::read(&source_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {source}: {e}");
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = &digest[..8];

    println!("cargo:rustc-env={env_var}={short_hash}");

    let derived_dir = static_dir.join(derived);
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&source_path, derived_dir.join(format!("{stem}.{short_hash}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
