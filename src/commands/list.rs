use anyhow::Result;
use colored::Colorize;

use crate::migrations::MigrationRegistry;

pub fn list_migrations(registry: &MigrationRegistry) -> Result<()> {
    print!("{}", render_listing(registry));
    Ok(())
}

fn render_listing(registry: &MigrationRegistry) -> String {
    let mut out = String::new();
    for step in registry.steps() {
        out.push_str(&format!("{:>4}  {}\n", step.id(), step.description()));
    }
    out.push_str(&format!(
        "\n{} {}\n",
        "Current schema version:".bold(),
        registry.current_version()
    ));
    out
}
