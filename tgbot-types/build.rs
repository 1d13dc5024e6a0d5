//! Build script: parse the bundled Bot API reference page and generate the
//! request/response types from it.
//!
//! Adding support for newly documented methods or types is as simple as
//! dropping a wider copy of `reference/bot-api.html` in and rebuilding — the
//! rest is automatic.

use std::env;
use std::path::Path;

use tgbot_tl_gen::{Config, Outputs, generate};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");

    let html_path = Path::new(&manifest_dir).join("reference/bot-api.html");
    let config_path = Path::new(&manifest_dir).join("reference/config.yaml");
    println!("cargo:rerun-if-changed={}", html_path.display());
    println!("cargo:rerun-if-changed={}", config_path.display());

    let html = std::fs::read_to_string(&html_path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", html_path.display()));

    let api = tgbot_tl_parser::parse_document(&html)
        .unwrap_or_else(|e| panic!("parsing {}: {e}", html_path.display()));
    api.check_invariants()
        .unwrap_or_else(|e| panic!("{} violates an IR invariant: {e}", html_path.display()));

    let config = Config::load(&config_path, &api)
        .unwrap_or_else(|e| panic!("loading {}: {e}", config_path.display()));

    let mut outputs =
        Outputs::from_dir(&out_dir).unwrap_or_else(|e| panic!("creating generated sources: {e}"));
    generate(&api, &config, &mut outputs).unwrap_or_else(|e| panic!("generating bindings: {e}"));
}
