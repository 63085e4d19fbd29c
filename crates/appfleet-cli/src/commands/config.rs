use std::path::Path;

use anyhow::Context;

use appfleet_core::FleetConfig;
use appfleet_platform::ConfigVars;

/// Parse a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn get(config: &Path, app: &str) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let deployer = super::deployer(&settings)?;

    let vars = deployer.get_config(app).await?;
    print_vars(&vars);
    Ok(())
}

pub async fn set(config: &Path, app: &str, vars: Vec<(String, String)>) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let deployer = super::deployer(&settings)?;

    let vars: ConfigVars = vars.into_iter().collect();
    let applied = deployer.set_config(app, &vars).await?;
    println!("✓ {app} config updated ({} vars)", applied.len());
    print_vars(&applied);
    Ok(())
}

/// Store the local config (the `config_keys` found in this environment)
/// under the remote config key.
pub async fn publish(config: &Path) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    if settings.remote_config.is_none() {
        anyhow::bail!("no [remote_config] section in {}", config.display());
    }
    let deployer = super::deployer(&settings)?;

    let count = deployer.config().publish().await?;
    println!("✓ published {count} vars to {}", deployer.config().key());
    Ok(())
}

pub fn add_key(config: &Path, key: &str) -> anyhow::Result<()> {
    let mut settings = if config.is_file() {
        FleetConfig::from_file(config).with_context(|| format!("reading {}", config.display()))?
    } else {
        FleetConfig::default()
    };
    settings.add_config_key(key)?;
    settings
        .save(config)
        .with_context(|| format!("writing {}", config.display()))?;

    println!("✓ added {} ({} keys)", key.trim(), settings.config_keys.len());
    Ok(())
}

pub fn list_keys(config: &Path) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    if settings.config_keys.is_empty() {
        println!("No config keys. Add one with `appfleet config add-key <KEY>`.");
        return Ok(());
    }

    let local = settings.local_config(std::env::vars());
    for key in &settings.config_keys {
        match local.get(key) {
            Some(value) => println!("{key} = {value}"),
            None => println!("{key} = (unset)"),
        }
    }
    Ok(())
}

fn print_vars(vars: &ConfigVars) {
    if vars.is_empty() {
        println!("(no config vars)");
    }
    for (key, value) in vars {
        println!("{key}={value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("DATABASE_URL=postgres://u:p@h/db?x=1").unwrap(),
            ("DATABASE_URL".to_string(), "postgres://u:p@h/db?x=1".to_string())
        );
        assert_eq!(parse_key_val("EMPTY=").unwrap(), ("EMPTY".to_string(), String::new()));
        assert!(parse_key_val("NOEQUALS").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn add_key_creates_and_extends_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appfleet.toml");

        add_key(&path, "DATABASE_URL").unwrap();
        add_key(&path, " REDIS_URL ").unwrap();

        let settings = FleetConfig::from_file(&path).unwrap();
        assert_eq!(settings.config_keys, ["DATABASE_URL", "REDIS_URL"]);
    }

    #[test]
    fn add_key_rejects_duplicates_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appfleet.toml");

        add_key(&path, "DATABASE_URL").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(add_key(&path, "DATABASE_URL").is_err());
        assert!(add_key(&path, "  ").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
