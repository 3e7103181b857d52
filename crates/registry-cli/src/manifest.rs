//! Run manifest: inputs with SHA-256 digests, effective configuration,
//! stage counts and produced artifacts.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use registry_config::RegistryConfig;
use registry_core::{DriverReport, StageReports};
use registry_ingest::SkippedFile;

pub const MANIFEST_SCHEMA: &str = "registry-run-manifest";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

const BUFFER_SIZE: usize = 65536;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub tool_version: &'static str,
    pub command: &'a str,
    pub inputs: Vec<InputFile>,
    pub skipped_inputs: &'a [SkippedFile],
    pub config: &'a RegistryConfig,
    pub stages: Option<&'a StageReports>,
    pub curves: Option<&'a DriverReport>,
    pub artifacts: &'a [PathBuf],
    pub errors: &'a [String],
}

/// Hex-encoded SHA-256 of a file's content.
pub fn file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn describe_input(path: &Path) -> Result<InputFile> {
    let bytes = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    Ok(InputFile {
        path: path.to_path_buf(),
        bytes,
        sha256: file_sha256(path)?,
    })
}

pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub fn write_manifest(path: &Path, manifest: &RunManifest<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("serialize run manifest")?;
    fs::write(path, format!("{json}\n")).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
