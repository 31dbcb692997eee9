//! Developer tasks (schema generation, fixture conformance, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    // If we're in the xtask directory, go up one level
    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(manifest_dir)
    } else {
        manifest_dir
    }
}

/// Get the schemas directory path.
fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_policy_schema() -> schemars::Schema {
    schema_for!(trustgate_domain::PolicyDocument)
}

fn generate_decision_schema() -> schemars::Schema {
    schema_for!(trustgate_types::Decision)
}

fn generate_simulation_schema() -> schemars::Schema {
    schema_for!(trustgate_types::Simulation)
}

fn generate_graph_schema() -> schemars::Schema {
    schema_for!(trustgate_domain::GraphDocument)
}

fn generate_context_schema() -> schemars::Schema {
    schema_for!(trustgate_domain::EvaluationContext)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(trustgate_settings::TrustgateConfigV1)
}

/// List of schemas to generate.
fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "trustgate.policy.v1.json",
            generate: generate_policy_schema,
        },
        SchemaSpec {
            filename: "trustgate.decision.v1.json",
            generate: generate_decision_schema,
        },
        SchemaSpec {
            filename: "trustgate.simulation.v1.json",
            generate: generate_simulation_schema,
        },
        SchemaSpec {
            filename: "trustgate.graph.v1.json",
            generate: generate_graph_schema,
        },
        SchemaSpec {
            filename: "trustgate.context.v1.json",
            generate: generate_context_schema,
        },
        SchemaSpec {
            filename: "trustgate.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();

    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create schemas directory")?;
    }

    for spec in schema_specs() {
        let schema = (spec.generate)();
        let json = serialize_schema(&schema)?;
        let path = dir.join(spec.filename);

        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;

        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);

        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }

    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate tests/fixtures/ against the generated schemas");
    eprintln!("  explain-coverage  Validate all reasons and operators have explanations");
}

fn compile(schema: &schemars::Schema) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value(schema).context("Failed to serialize schema")?;
    jsonschema::validator_for(&value).map_err(|e| anyhow::anyhow!("Failed to compile schema: {}", e))
}

/// Every `*.json` file directly under `dir` (or, with `nested`, `dir/*/{name}`), sorted.
fn fixture_files(dir: &Path, nested: Option<&str>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        match nested {
            Some(name) => {
                let candidate = path.join(name);
                if path.is_dir() && candidate.exists() {
                    files.push(candidate);
                }
            }
            None => {
                if path.extension().is_some_and(|ext| ext == "json") {
                    files.push(path);
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Validate fixture documents against the schemas generated from the Rust types.
///
/// This checks:
/// 1. stored policies against `trustgate.policy.v1`
/// 2. case contexts against `trustgate.context.v1`
/// 3. expected decisions against `trustgate.decision.v1`
/// 4. graph documents against `trustgate.graph.v1`
fn conform() -> anyhow::Result<()> {
    let fixtures = fixtures_dir();
    let cases = fixtures.join("cases");
    let groups = [
        (
            "policy",
            generate_policy_schema(),
            fixture_files(&fixtures.join("policies"), None)?,
        ),
        (
            "context",
            generate_context_schema(),
            fixture_files(&cases, Some("context.json"))?,
        ),
        (
            "decision",
            generate_decision_schema(),
            fixture_files(&cases, Some("expected.decision.json"))?,
        ),
        (
            "graph",
            generate_graph_schema(),
            fixture_files(&fixtures.join("graphs"), None)?,
        ),
    ];

    let mut errors = Vec::new();
    for (label, schema, files) in &groups {
        let validator = compile(schema)?;
        if files.is_empty() {
            errors.push(format!("no {label} fixtures found"));
        }
        for path in files {
            let display = path
                .strip_prefix(&fixtures)
                .unwrap_or(path)
                .display()
                .to_string();
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", display))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {} as JSON", display))?;
            for err in validator.iter_errors(&value) {
                errors.push(format!("{}: {} schema: {}", display, label, err));
            }
        }
        println!("✓ {} {} fixture(s) checked", files.len(), label);
    }

    if errors.is_empty() {
        println!("\n✓ All fixtures conform!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("Conformance failed with {} errors", errors.len())
    }
}

/// Validate that all reasons and operators have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let reasons = trustgate_types::explain::all_reasons();
    let operators = trustgate_types::explain::all_operators();

    let mut errors = Vec::new();
    for (kind, identifiers) in [("Reason", reasons), ("Operator", operators)] {
        for identifier in identifiers {
            match trustgate_types::explain::lookup_explanation(identifier) {
                Some(exp) => {
                    if exp.title.is_empty() {
                        errors.push(format!("{kind} '{identifier}' has empty title"));
                    }
                    if exp.description.is_empty() {
                        errors.push(format!("{kind} '{identifier}' has empty description"));
                    }
                    if exp.remediation.is_empty() {
                        errors.push(format!("{kind} '{identifier}' has empty remediation"));
                    }
                }
                None => errors.push(format!("{kind} '{identifier}' has no explanation")),
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} reasons have explanations", reasons.len());
        println!("✓ {} operators have explanations", operators.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            println!("{}", trustgate_types::SCHEMA_DECISION_V1);
            for spec in schema_specs() {
                let name = spec.filename.trim_end_matches(".json");
                println!("{}", name);
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
