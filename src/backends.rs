//! Backend registration and dispatch
//!
//! This module provides a centralized registry for all storage backends,
//! with support for feature-gated inclusion and dynamic help text
//! generation.

use crate::cli::Commands;
use crate::commands;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory NAND partitions for testing (board=<file.toml>)",
    });

    #[cfg(feature = "linux-mtd")]
    backends.push(BackendInfo {
        name: "linux_mtd",
        aliases: &["linux-mtd", "mtd"],
        description: "Linux MTD partitions via /dev/mtdN (sysfs=<dir>,dev=<dir>)",
    });

    backends
}

/// Generate help text listing all available backends
pub fn backend_help() -> String {
    let backends = available_backends();

    if backends.is_empty() {
        return "No backends available (recompile with backend features enabled)".to_string();
    }

    let mut help = String::from("Available backends:\n");
    for b in &backends {
        help.push_str(&format!("  {:12} - {}\n", b.name, b.description));
    }
    help
}

/// Generate a short list of backend names for CLI help
pub fn backend_names_short() -> String {
    let backends = available_backends();
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Resolve a backend name or alias to its primary name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> Result<(&str, Vec<(&str, &str)>), String> {
    let Some((name, opts)) = s.split_once(':') else {
        return Ok((s, Vec::new()));
    };

    let mut options = Vec::new();
    for opt in opts.split(',').filter(|o| !o.is_empty()) {
        match opt.split_once('=') {
            Some(kv) => options.push(kv),
            None => {
                return Err(format!(
                    "Invalid backend option: '{}' (expected key=value)",
                    opt
                ))
            }
        }
    }
    Ok((name, options))
}

/// Open the backend named in `backend` and run `command` against it
#[allow(unused_variables)]
pub fn run_with_backend(
    backend: &str,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let (name, options) = parse_backend_string(backend)?;

    let canonical_name = match find_backend(name) {
        Some(n) => n,
        None => return Err(unknown_backend_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            log::info!("Opening dummy backend...");
            let driver = fbflash_dummy::open_dummy(&options)
                .map_err(|e| format!("Failed to set up dummy backend: {}", e))?;
            commands::run(driver, command)
        }

        #[cfg(feature = "linux-mtd")]
        "linux_mtd" => {
            log::info!("Opening Linux MTD backend...");
            let driver = fbflash_linux_mtd::open_linux_mtd(&options)
                .map_err(|e| format!("Invalid linux_mtd parameters: {}", e))?;
            commands::run(driver, command)
        }

        _ => Err(unknown_backend_error(name)),
    }
}

fn unknown_backend_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown backend: {}\n\n", name);
    msg.push_str(&backend_help());
    msg.push_str("\nUse 'fbflash list-backends' for more details");
    msg.into()
}
