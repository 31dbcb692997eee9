use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::path::PathBuf;
use trustgate_domain::PolicyDocument;
use walkdir::WalkDir;

/// Find policy documents (`*.json`) under `dir`, recursively, in sorted path order.
pub fn discover_policy_files(dir: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("policy directory {dir} does not exist");
    }

    let mut out: Vec<Utf8PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| pathbuf_to_utf8(e.path().to_path_buf()))
        .filter(|p| p.extension() == Some("json"))
        .collect();

    // Stable order regardless of traversal order.
    out.sort();
    Ok(out)
}

/// Load every policy document under `dir`.
///
/// Documents without an `id` take their file stem. Duplicate ids are an error.
pub fn load_policy_dir(dir: &Utf8Path) -> anyhow::Result<Vec<PolicyDocument>> {
    let mut docs: Vec<PolicyDocument> = Vec::new();
    for path in discover_policy_files(dir).context("discover policy files")? {
        let text = std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        let mut doc: PolicyDocument =
            serde_json::from_str(&text).with_context(|| format!("parse {path}"))?;
        if doc.id.is_empty() {
            doc.id = path.file_stem().unwrap_or_default().to_string();
        }
        if docs.iter().any(|d| d.id == doc.id) {
            anyhow::bail!("duplicate policy id '{}' in {path}", doc.id);
        }
        tracing::debug!(policy_id = %doc.id, %path, "loaded policy");
        docs.push(doc);
    }
    Ok(docs)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn discovers_json_files_in_sorted_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("zeta.json"), "{}");
        write_file(&root.join("nested/alpha.json"), "{}");
        write_file(&root.join("notes.txt"), "ignored");
        write_file(&root.join("beta.json"), "{}");

        let files = discover_policy_files(&root).expect("discover");
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&root).expect("under root").as_str().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["beta.json", "nested/alpha.json", "zeta.json"]);
    }

    #[test]
    fn missing_ids_default_to_file_stem() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("trust-gate.json"), r#"{ "name": "Trust gate" }"#);
        write_file(&root.join("other.json"), r#"{ "id": "explicit" }"#);

        let docs = load_policy_dir(&root).expect("load");
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["explicit", "trust-gate"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("a.json"), r#"{ "id": "same" }"#);
        write_file(&root.join("b.json"), r#"{ "id": "same" }"#);

        let err = load_policy_dir(&root).unwrap_err();
        assert!(err.to_string().contains("duplicate policy id"));
    }

    #[test]
    fn invalid_json_names_the_file() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("broken.json"), "{ nope");

        let err = load_policy_dir(&root).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp).join("absent");
        assert!(discover_policy_files(&root).is_err());
    }
}
