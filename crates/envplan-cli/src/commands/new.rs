use super::{json_pretty, write_atomic, EXIT_SUCCESS};
use envplan_schema::{get_preset, list_presets, parse_manifest_str, Preset};
use std::path::{Path, PathBuf};

pub const DEST_MANIFEST: &str = "envplan.toml";
const DEFAULT_TEMPLATE: &str = "minimal";

fn load_template(name: &str) -> Result<&'static Preset, String> {
    let preset = get_preset(name).ok_or_else(|| {
        let known: Vec<&str> = list_presets().iter().map(|p| p.name).collect();
        format!("unknown template '{name}' (expected: {})", known.join(", "))
    })?;
    parse_manifest_str(preset.manifest)
        .and_then(|m| m.normalize())
        .map_err(|e| format!("template parse error: {e}"))?;
    Ok(preset)
}

fn ensure_can_write(dest: &Path, force: bool) -> Result<(), String> {
    if dest.exists() && !force {
        return Err(format!(
            "refusing to overwrite existing {} (pass --force)",
            dest.display()
        ));
    }
    Ok(())
}

/// Scaffold `<name>/envplan.toml` from a built-in preset.
pub fn run(name: &str, template: Option<&str>, force: bool, json: bool) -> Result<u8, String> {
    if name.trim().is_empty() {
        return Err("environment name must not be empty".to_owned());
    }
    let template = template.unwrap_or(DEFAULT_TEMPLATE);
    let preset = load_template(template)?;

    let dir = PathBuf::from(name);
    let dest = dir.join(DEST_MANIFEST);
    ensure_can_write(&dest, force)?;
    std::fs::create_dir_all(&dir).map_err(|e| format!("create {}: {e}", dir.display()))?;
    write_atomic(&dest, preset.manifest)?;

    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": dest.display().to_string(),
            "name": name,
            "template": template,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {} for '{name}'", dest.display());
        println!("template: {template}");
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_parse() {
        for preset in list_presets() {
            let loaded = load_template(preset.name).unwrap();
            assert_eq!(loaded.name, preset.name);
        }
    }

    #[test]
    fn unknown_template_lists_known_ones() {
        let err = load_template("rust-dev").unwrap_err();
        assert!(err.starts_with("unknown template"));
        assert!(err.contains("python-data"));
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(DEST_MANIFEST);
        assert!(ensure_can_write(&dest, false).is_ok());
        std::fs::write(&dest, "manifest_version = 1\n").unwrap();
        assert!(ensure_can_write(&dest, false).is_err());
        assert!(ensure_can_write(&dest, true).is_ok());
    }
}
