use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::client::Resolwe;
use crate::download::RemoteFile;
use crate::util::urljoin;

/// Genomic sample metadata, as reported by `/api/sample`.
///
/// Samples are fetched, never constructed locally, and are immutable from
/// the caller's side.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Sample {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Annotation document; shape is defined by the server-side schema.
    #[serde(default)]
    pub descriptor: Value,
}

/// A processed data object attached to a sample, from `/api/data`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct DataObject {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) output: Value,
}

impl Sample {
    /// Downloads every file associated with this sample into `dir`
    /// (the current directory when `None`), returning the written paths.
    ///
    /// Data objects that have not finished processing are skipped. The
    /// first file that cannot be completed aborts the call; files already
    /// written stay on disk.
    pub fn download(&self, resolwe: &Resolwe, dir: Option<&Path>) -> Result<Vec<PathBuf>> {
        let entity = self.id.to_string();
        let data: Vec<DataObject> = resolwe.api_get("api/data", &[("entity", entity.as_str())])?;

        let dir = dir.unwrap_or_else(|| Path::new("."));
        let transfer = resolwe.transfer();
        let mut written = Vec::new();

        for d in &data {
            if d.status.as_deref().is_some_and(|s| s != "OK") {
                continue;
            }
            for file in d.files(resolwe.base_url()) {
                let path = transfer.fetch(&file, dir).with_context(|| {
                    format!("failed to download '{}' (data {})", file.file_name, d.id)
                })?;
                written.push(path);
            }
        }

        Ok(written)
    }
}

impl DataObject {
    /// Files referenced by this data object's `output` document.
    ///
    /// File fields are JSON objects holding a string `file` name, an
    /// optional numeric `size` and an optional `refs` list of auxiliary
    /// paths. They may sit at any depth inside `output`.
    pub(crate) fn files(&self, base_url: &str) -> Vec<RemoteFile> {
        let mut names = Vec::new();
        collect_file_refs(&self.output, &mut names);

        names
            .into_iter()
            .map(|(name, size)| RemoteFile {
                location: urljoin(base_url, &format!("data/{}/{}", self.id, name)),
                file_name: name,
                size,
            })
            .collect()
    }
}

fn collect_file_refs(value: &Value, out: &mut Vec<(String, Option<u64>)>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("file") {
                let size = map.get("size").and_then(Value::as_u64);
                push_unique(out, name.clone(), size);
                if let Some(Value::Array(refs)) = map.get("refs") {
                    for r in refs {
                        if let Value::String(r) = r {
                            push_unique(out, r.clone(), None);
                        }
                    }
                }
            } else {
                for v in map.values() {
                    collect_file_refs(v, out);
                }
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_file_refs(v, out);
            }
        }
        _ => {}
    }
}

fn push_unique(out: &mut Vec<(String, Option<u64>)>, name: String, size: Option<u64>) {
    if !out.iter().any(|(n, _)| *n == name) {
        out.push((name, size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_nested_file_fields() {
        let output = json!({
            "fastq": [
                {"file": "reads_1.fastq.gz", "size": 1024},
                {"file": "reads_2.fastq.gz", "size": 2048}
            ],
            "fastqc": {
                "report": {"file": "fastqc.zip", "refs": ["fastqc/report.html"]}
            },
            "species": "Homo sapiens"
        });

        let mut names = Vec::new();
        collect_file_refs(&output, &mut names);

        assert_eq!(
            names,
            vec![
                ("reads_1.fastq.gz".to_string(), Some(1024)),
                ("reads_2.fastq.gz".to_string(), Some(2048)),
                ("fastqc.zip".to_string(), None),
                ("fastqc/report.html".to_string(), None),
            ]
        );
    }

    #[test]
    fn duplicate_references_collapse() {
        let output = json!({
            "a": {"file": "shared.bam"},
            "b": {"file": "shared.bam", "size": 7}
        });

        let mut names = Vec::new();
        collect_file_refs(&output, &mut names);
        assert_eq!(names, vec![("shared.bam".to_string(), None)]);
    }

    #[test]
    fn scalar_output_has_no_files() {
        let mut names = Vec::new();
        collect_file_refs(&json!({"count": 42, "ok": true}), &mut names);
        assert!(names.is_empty());
    }

    #[test]
    fn files_build_download_urls() {
        let d = DataObject {
            id: 11,
            status: Some("OK".to_string()),
            output: json!({"bam": {"file": "aln.bam", "size": 10}}),
        };

        let files = d.files("https://app.genialis.com");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].location, "https://app.genialis.com/data/11/aln.bam");
        assert_eq!(files[0].file_name, "aln.bam");
        assert_eq!(files[0].size, Some(10));
    }
}
