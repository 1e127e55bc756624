use super::{heading, json_pretty, EXIT_SUCCESS};
use envplan_schema::{parse_manifest_file, CompilerConfig};
use std::path::Path;

fn package_line(packages: &[String]) -> String {
    if packages.is_empty() {
        "(none)".to_owned()
    } else {
        packages.join(" ")
    }
}

/// Print the normalized descriptor and the config it compiles against.
pub fn run(config: CompilerConfig, manifest: &Path, json: bool) -> Result<u8, String> {
    let normalized = parse_manifest_file(manifest)
        .and_then(|m| m.normalize())
        .map_err(|e| format!("manifest error: {e}"))?;
    let effective = config.with_manifest_overrides(&normalized);

    if json {
        let payload = serde_json::json!({
            "manifest": normalized,
            "config": effective,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    let env = &normalized.environment;
    println!("{}", heading("environment"));
    println!("  os:        {}", env.os());
    println!("  language:  {}", env.language());
    println!("  system:    {}", package_line(env.system_packages()));
    println!("  python:    {}", package_line(env.language_packages()));
    println!("{}", heading("build"));
    println!("  image:     {}", effective.base_image);
    println!("  index:     {}", effective.python_index_url);
    println!("  context:   {}", effective.context_name);
    println!("  platform:  {}", effective.platform);
    Ok(EXIT_SUCCESS)
}
