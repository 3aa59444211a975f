use std::path::Path;

use anyhow::Context;
use kconvert::{Kustomization, ResourceMap};
use serde::Deserialize as _;

datatest_stable::harness! {
    { test = test, root = "tests/kconvert/testdata", pattern = r".*/input.yaml" },
}

/// Converts `input.yaml` and compares the kustomization, followed by the remaining resources,
/// against `expected.yaml`. A failing conversion is compared against `expected.stderr` instead.
fn test(path: &Path) -> datatest_stable::Result<()> {
    let dir = path.parent().unwrap();
    let input = std::fs::read_to_string(path).context("reading input")?;
    let mut resources = ResourceMap::from_yaml_str(&input)?;
    let mut kustomization = Kustomization::default();

    match kconvert::convert(&mut kustomization, &mut resources) {
        Ok(()) => {
            let mut documents = vec![serde_yaml::to_string(&kustomization)?];
            for resource in resources.iter() {
                documents.push(serde_yaml::to_string(resource)?);
            }
            let actual = documents.join("---\n");
            snapshot(&dir.join("expected.yaml"), &actual)?;
        }
        Err(err) => snapshot(&dir.join("expected.stderr"), &format!("{err:#}\n"))?,
    }
    Ok(())
}

fn snapshot(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if same_documents(&expected, actual, path)? {
        return Ok(());
    }

    let chunks = dissimilar::diff(&expected, actual);
    let formatted = format_chunks(chunks);
    eprintln!("Snapshot mismatch for {}:\n{}", path.display(), formatted);

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

/// YAML snapshots are compared by value so that quoting and key order do not matter, anything
/// else is compared as text.
fn same_documents(expected: &str, actual: &str, path: &Path) -> anyhow::Result<bool> {
    if path.extension().is_none_or(|ext| ext != "yaml") {
        return Ok(expected == actual);
    }

    let parse = |s: &str| {
        serde_yaml::Deserializer::from_str(s)
            .map(serde_yaml::Value::deserialize)
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(parse(expected).context("parsing snapshot")? == parse(actual).context("parsing output")?)
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{}\x1b[0m", text),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{}\x1b[0m", text),
        };
        buf.push_str(&formatted);
    }
    buf
}
