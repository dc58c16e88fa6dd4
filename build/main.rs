//! The build script reads `Boron.toml` and turns its knobs into `cfg` flags
//! and generated constants consumed by the executive at compile time.
//!
//! This mirrors the teacher kernel's config-driven build (a TOML file read
//! with `serde`, expanded into `cargo:rustc-cfg` lines and small generated
//! `OUT_DIR` files) without the C cross-compilation machinery that kernel
//! also carries, since the core executive specified here has no C sources
//! of its own.

use serde::Deserialize;
use std::{env, fs, path::Path};

/// Tunable knobs for the executive, normally checked into `Boron.toml` at
/// the workspace root. Every field has a sensible default so the build
/// still succeeds if the file is absent.
#[derive(Deserialize)]
#[serde(default)]
struct Config {
    /// Maximum number of logical processors the kernel is built to support.
    max_cpus: u32,
    /// Number of scheduler priority levels (0 = idle .. n-1 = highest).
    priority_levels: u32,
    /// Scheduler tick frequency, in Hz, used to size a quantum.
    tick_hz: u32,
    /// Maximum number of wait blocks embedded directly in a thread.
    embedded_wait_blocks: u32,
    /// Hard cap on wait blocks for a single `WaitForMultipleObjects` call.
    max_wait_blocks: u32,
    /// Enables extra bookkeeping assertions meant for debug builds.
    debug_asserts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cpus: 64,
            priority_levels: 32,
            tick_hz: 100,
            embedded_wait_blocks: 4,
            max_wait_blocks: 64,
            debug_asserts: cfg!(debug_assertions),
        }
    }
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let config_path = Path::new(&manifest_dir).join("Boron.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config: Config = if let Ok(text) = fs::read_to_string(&config_path) {
        toml::from_str(&text).unwrap_or_else(|e| {
            panic!("failed to parse {}: {e}", config_path.display());
        })
    } else {
        Config::default()
    };

    if config.debug_asserts {
        println!("cargo:rustc-cfg=config_debug_asserts");
    }

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest = Path::new(&out_dir).join("config.rs");
    let generated = format!(
        "// @generated by build/main.rs from Boron.toml\n\
         pub const MAX_CPUS: usize = {};\n\
         pub const PRIORITY_LEVELS: usize = {};\n\
         pub const TICK_HZ: u32 = {};\n\
         pub const EMBEDDED_WAIT_BLOCKS: usize = {};\n\
         pub const MAX_WAIT_BLOCKS: usize = {};\n",
        config.max_cpus,
        config.priority_levels,
        config.tick_hz,
        config.embedded_wait_blocks,
        config.max_wait_blocks,
    );
    fs::write(&dest, generated).unwrap_or_else(|e| {
        panic!("failed to write {}: {e}", dest.display());
    });
}
