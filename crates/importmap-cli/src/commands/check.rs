use anyhow::Result;
use importmap_config::Config;
use std::path::PathBuf;

pub fn handle(path: PathBuf) -> Result<()> {
    let config = Config::load(&path)?;
    let outcome = config.pipeline_options();

    if outcome.is_clean() {
        println!("✓ {} is valid", path.display());
        println!("  Output: {}", config.file_name);
        if let Some(url) = &config.base_import_map {
            println!("  Base import map: {}", url);
        }
        return Ok(());
    }

    for error in &outcome.errors {
        println!("  {}", error);
    }
    anyhow::bail!(
        "{} problem(s) found in {}",
        outcome.errors.len(),
        path.display()
    )
}
