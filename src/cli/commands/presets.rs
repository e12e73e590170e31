//! List presets command.

use anyhow::Result;
use rotator_engine::PresetRegistry;

use crate::cli::PresetsArgs;

pub fn run(args: PresetsArgs) -> Result<()> {
    let registry = PresetRegistry::new();

    println!("Available Presets");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for (key, info) in registry.names().into_iter().zip(registry.list()) {
        println!("  {} ({})", info.name, key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if args.verbose {
            let json = serde_json::to_string_pretty(&info.default_config)?;
            for line in json.lines() {
                println!("    {}", line);
            }
        }
        println!();
    }

    println!("Use `replay --preset <name> --symbols A,B,C` to run one.");

    Ok(())
}
