use anyhow::{bail, Result};
use booknotes::config::{mask, Credentials};
use booknotes::constants;

use super::Globals;

/// `config show` — effective settings plus credential status.
pub fn run_show(globals: &Globals) -> Result<()> {
    globals.load_env()?;
    let settings = globals.settings();
    println!("{}", serde_json::to_string_pretty(&settings)?);

    println!();
    for key in [
        constants::ENV_NOTION_TOKEN,
        constants::ENV_LIBRARY_ID,
        constants::ENV_NOTES_ID,
        constants::ENV_OPENAI_KEY,
    ] {
        let shown = match std::env::var(key) {
            Ok(v) if !v.trim().is_empty() => {
                if key == constants::ENV_NOTION_TOKEN || key == constants::ENV_OPENAI_KEY {
                    mask(&v)
                } else {
                    v
                }
            }
            _ => "(not set)".to_string(),
        };
        println!("{:<10} {}", key, shown);
    }

    if let Err(e) = Credentials::from_env() {
        println!("\n{}", e);
    }
    Ok(())
}

/// `config get <key>` — display a single settings value.
///
/// Key uses dot notation: `openai.model`, `note_properties.source`
pub fn run_get(globals: &Globals, key: &str) -> Result<()> {
    let config = serde_json::to_value(globals.settings())?;
    match resolve_path(&config, key) {
        Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
        None => bail!("Key not found: {}", key),
    }
    Ok(())
}

fn resolve_path<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.').try_fold(value, |current, part| current.get(part))
}
