// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural codec: PDF page <-> structural document, via the qpdf
// structural-rewrite tool run as a subprocess.
//
// One subprocess per call, no retries. Children are spawned with
// `kill_on_drop`, so a caller that abandons a call (outer timeout) also ends
// the process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use pagewerk_core::EnhanceConfig;
use pagewerk_core::error::{PagewerkError, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::document::StructuralDocument;

/// Default bound on a single encode or decode subprocess.
pub const DEFAULT_CODEC_TIMEOUT_SECS: u64 = 30;

/// Bidirectional conversion between one PDF page and a structural document.
#[async_trait]
pub trait StructuralCodec: Send + Sync {
    /// Encode page `page_index` (zero-based) of the PDF at `pdf_path`.
    async fn encode(&self, pdf_path: &Path, page_index: usize) -> Result<StructuralDocument>;

    /// Rebuild a PDF from `document`, writing it to `output_path`.
    async fn decode_to_file(
        &self,
        document: &StructuralDocument,
        output_path: &Path,
    ) -> Result<()>;

    /// Rebuild a PDF from `document` and return its bytes.
    async fn decode(&self, document: &StructuralDocument) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let path = scratch.path().join("page.pdf");
        self.decode_to_file(document, &path).await?;
        Ok(tokio::fs::read(&path).await?)
    }
}

/// `StructuralCodec` backed by the qpdf binary.
#[derive(Debug, Clone)]
pub struct QpdfCodec {
    program: PathBuf,
    encode_timeout: Duration,
    decode_timeout: Duration,
}

impl QpdfCodec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            encode_timeout: Duration::from_secs(DEFAULT_CODEC_TIMEOUT_SECS),
            decode_timeout: Duration::from_secs(DEFAULT_CODEC_TIMEOUT_SECS),
        }
    }

    /// Build from the resolved tool path and timeouts in `config`.
    pub fn from_config(config: &EnhanceConfig) -> Self {
        Self::new(&config.tools.qpdf)
            .with_timeouts(config.encode_timeout(), config.decode_timeout())
    }

    pub fn with_timeouts(mut self, encode: Duration, decode: Duration) -> Self {
        self.encode_timeout = encode;
        self.decode_timeout = decode;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments requesting structured-JSON output for one page on stdout.
    fn encode_args(pdf_path: &Path, page_index: usize) -> Vec<OsString> {
        vec![
            "--qdf".into(),
            "--json".into(),
            pdf_path.as_os_str().to_owned(),
            "--pages".into(),
            ".".into(),
            (page_index + 1).to_string().into(),
            "--".into(),
            "-".into(),
        ]
    }

    /// Arguments reading structured JSON from stdin and writing a PDF.
    fn decode_args(output_path: &Path) -> Vec<OsString> {
        vec!["--qdf".into(), "-".into(), output_path.as_os_str().to_owned()]
    }

    fn command(&self, args: Vec<OsString>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl StructuralCodec for QpdfCodec {
    #[instrument(skip_all, fields(pdf = %pdf_path.display(), page_index))]
    async fn encode(&self, pdf_path: &Path, page_index: usize) -> Result<StructuralDocument> {
        let mut command = self.command(Self::encode_args(pdf_path, page_index));
        command.stdin(Stdio::null());

        let child = command.spawn().map_err(|err| {
            PagewerkError::ConversionError(format!(
                "cannot start {}: {}",
                self.program.display(),
                err
            ))
        })?;

        let output = tokio::time::timeout(self.encode_timeout, child.wait_with_output())
            .await
            .map_err(|_| PagewerkError::ConversionTimeout(self.encode_timeout.as_secs()))?
            .map_err(|err| {
                PagewerkError::ConversionError(format!(
                    "waiting for {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            return Err(PagewerkError::ConversionError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let document = StructuralDocument::from_json(&output.stdout)?;
        debug!(
            objects = document.objects.len(),
            streams = document.stream_count(),
            json_bytes = output.stdout.len(),
            "page encoded"
        );
        Ok(document)
    }

    #[instrument(skip_all, fields(output = %output_path.display()))]
    async fn decode_to_file(
        &self,
        document: &StructuralDocument,
        output_path: &Path,
    ) -> Result<()> {
        let payload = document.to_json()?;

        let mut command = self.command(Self::decode_args(output_path));
        command.stdin(Stdio::piped());

        let mut child = command.spawn().map_err(|err| {
            PagewerkError::ReconstructionError(format!(
                "cannot start {}: {}",
                self.program.display(),
                err
            ))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PagewerkError::ReconstructionError("child stdin unavailable".into()))?;

        let writer = async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        };
        let exchange = async { tokio::join!(writer, child.wait_with_output()) };

        let (written, output) = tokio::time::timeout(self.decode_timeout, exchange)
            .await
            .map_err(|_| {
                PagewerkError::ReconstructionError(format!(
                    "{} timed out after {}s",
                    self.program.display(),
                    self.decode_timeout.as_secs()
                ))
            })?;

        let output = output.map_err(|err| {
            PagewerkError::ReconstructionError(format!(
                "waiting for {}: {}",
                self.program.display(),
                err
            ))
        })?;

        // A failing exit explains a broken stdin pipe better than the pipe error.
        if !output.status.success() {
            return Err(PagewerkError::ReconstructionError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written.map_err(|err| {
            PagewerkError::ReconstructionError(format!("writing structure to stdin: {err}"))
        })?;

        if !output_path.exists() {
            return Err(PagewerkError::ReconstructionError(format!(
                "{} reported success but wrote no {}",
                self.program.display(),
                output_path.display()
            )));
        }

        debug!("page decoded");
        Ok(())
    }
}
