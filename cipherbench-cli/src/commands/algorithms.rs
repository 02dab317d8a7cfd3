// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cipherbench algorithms` command - List registered transform plugins.

use cipherbench_core::PluginRegistry;

pub async fn execute() -> anyhow::Result<()> {
    let registry = PluginRegistry::with_builtin();

    println!("╔════════════════════════╦════════════════════════╗");
    println!("║ Algorithm              ║ Result File Prefix     ║");
    println!("╠════════════════════════╬════════════════════════╣");

    for algorithm in registry.algorithms() {
        println!(
            "║ {:<22} ║ {:<22} ║",
            algorithm.as_str(),
            algorithm.file_prefix()
        );
    }

    println!("╚════════════════════════╩════════════════════════╝");
    println!();
    println!("Total: {} algorithm(s)", registry.len());

    Ok(())
}
