//! Every sqlx query literal in the workspace must be written for
//! PostgreSQL: `$N` bind placeholders, no SQLite leftovers.

use std::fs;
use std::path::{Path, PathBuf};

fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            rust_sources(&path, out);
        } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

/// Pulls the first string literal after each `sqlx::query` call site.
/// Handles plain `"..."` and raw `r"..."`/`r#"..."#` literals, which is
/// all this codebase uses.
fn sql_literals(content: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = content[pos..].find("sqlx::query") {
        let call = pos + rel;
        pos = call + "sqlx::query".len();

        let Some(paren) = content[call..].find('(') else {
            continue;
        };
        let rest = content[call + paren + 1..].trim_start();

        let literal = if let Some(raw) = rest.strip_prefix("r#\"") {
            raw.split("\"#").next()
        } else if let Some(raw) = rest.strip_prefix("r\"") {
            raw.split('"').next()
        } else if let Some(plain) = rest.strip_prefix('"') {
            plain.split('"').next()
        } else {
            None
        };

        if let Some(sql) = literal {
            found.push(sql.to_string());
        }
    }

    found
}

#[test]
fn sqlx_literals_are_postgres_only() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let roots = [
        manifest.join("src"),
        manifest.join("../../libs/atelier-db/src"),
    ];

    let mut files = Vec::new();
    for root in &roots {
        rust_sources(root, &mut files);
    }
    assert!(!files.is_empty(), "no Rust sources found to scan");

    let mut violations = Vec::new();
    for file in files {
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        for sql in sql_literals(&content) {
            let lower = sql.to_lowercase();
            if sql.contains('?') {
                violations.push(format!("{}: '?' placeholder in: {sql}", file.display()));
            }
            if lower.contains("insert or ignore")
                || lower.contains("strftime(")
                || lower.contains("datetime(")
            {
                violations.push(format!("{}: SQLite-only syntax in: {sql}", file.display()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "non-PostgreSQL SQL found:\n{}",
        violations.join("\n")
    );
}
