//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `hoststub_core` linkage.
//! - Print the compiled-in stub contract without needing a host.

use hoststub_core::{core_version, process_bindings, PACKAGE_NAME, STUB_MAGIC};

fn main() {
    println!("hoststub_core version={}", core_version());
    println!("hoststub_core stub_magic={STUB_MAGIC:#010x}");
    println!("hoststub_core package={}", PACKAGE_NAME.to_string_lossy());
    match serde_json::to_string(&process_bindings().current().snapshot()) {
        Ok(json) => println!("hoststub_core bindings={json}"),
        Err(err) => eprintln!("hoststub_core bindings unavailable: {err}"),
    }
}
