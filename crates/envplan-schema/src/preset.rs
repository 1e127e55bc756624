use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub manifest: &'static str,
}

pub const BUILTIN_PRESETS: &[Preset] = &[
    Preset {
        name: "minimal",
        description: "Base image with the SSH helper and no extra packages",
        manifest: r"manifest_version = 1
",
    },
    Preset {
        name: "python-data",
        description: "Python data analysis stack",
        manifest: r#"manifest_version = 1

[system]
packages = ["git", "curl"]

[python]
packages = ["numpy", "pandas", "matplotlib", "jupyterlab"]
"#,
    },
    Preset {
        name: "python-web",
        description: "Python web service development",
        manifest: r#"manifest_version = 1

[system]
packages = ["git", "curl", "libpq-dev"]

[python]
packages = ["fastapi", "uvicorn", "psycopg2", "pytest"]
"#,
    },
    Preset {
        name: "python-ml",
        description: "Python machine learning environment",
        manifest: r#"manifest_version = 1

[system]
packages = ["git", "curl", "build-essential"]

[python]
packages = ["numpy", "scipy", "scikit-learn", "torch"]
"#,
    },
];

pub fn get_preset(name: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

pub fn list_presets() -> &'static [Preset] {
    BUILTIN_PRESETS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_parse_and_normalize() {
        for preset in BUILTIN_PRESETS {
            let result = crate::parse_manifest_str(preset.manifest).and_then(|m| m.normalize());
            assert!(
                result.is_ok(),
                "preset '{}' failed to parse: {:?}",
                preset.name,
                result.err()
            );
        }
    }

    #[test]
    fn get_preset_by_name() {
        assert!(get_preset("python-data").is_some());
        assert!(get_preset("nonexistent").is_none());
    }

    #[test]
    fn minimal_preset_is_bare() {
        let preset = get_preset("minimal").unwrap();
        let normalized = crate::parse_manifest_str(preset.manifest)
            .unwrap()
            .normalize()
            .unwrap();
        assert!(normalized.environment.is_bare());
    }

    #[test]
    fn all_presets_have_unique_names() {
        let mut names: Vec<&str> = BUILTIN_PRESETS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_PRESETS.len());
    }
}
