//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `ttshub_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use ttshub_core::ExtensionResolver;

fn main() {
    println!("ttshub_core ping={}", ttshub_core::ping());
    println!("ttshub_core version={}", ttshub_core::core_version());

    // Resolves against the stock working-directory layout; absent source
    // files simply count as zero.
    let resolver = ExtensionResolver::with_standard_paths();
    println!(
        "interface_extensions={}",
        resolver.interface_extensions().len()
    );
    println!(
        "decorator_extensions={}",
        resolver.decorator_extensions().len()
    );
}
