use anyhow::{Context, Result, anyhow, bail};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::util::sanitize_file_name;

/// One downloadable file attached to a data object.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Download URL.
    pub location: String,
    /// Server-side file name, possibly with subdirectories.
    pub file_name: String,
    /// Expected size in bytes, when the server reported one.
    pub size: Option<u64>,
}

/// Blocking file transfer with resume support and bounded retries.
pub(crate) struct Transfer<'a> {
    pub(crate) http: &'a HttpClient,
    pub(crate) retry_max: usize,
    pub(crate) sleep_max: Duration,
    pub(crate) progress: bool,
}

impl Transfer<'_> {
    /// Downloads `file` into `dir`, returning the written path.
    ///
    /// A partial file left by an earlier run is resumed with a `Range`
    /// request when the expected size is known.
    pub(crate) fn fetch(&self, file: &RemoteFile, dir: &Path) -> Result<PathBuf> {
        let rel = sanitize_file_name(&file.file_name)
            .ok_or_else(|| anyhow!("unusable file name '{}'", file.file_name))?;
        let target = dir.join(rel);

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let mut downloaded: u64 = 0;
        let mut mode_append = false;
        let mut range_from: Option<u64> = None;

        if let Some(size) = file.size {
            if target.exists() {
                let existing = std::fs::metadata(&target)?.len();
                if existing < size {
                    downloaded = existing;
                    mode_append = true;
                    range_from = Some(existing);
                }
            }
        }

        let pb = if self.progress {
            let pb = match file.size {
                Some(size) => {
                    let pb = ProgressBar::new(size);
                    pb.set_style(
                        ProgressStyle::with_template(
                            "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                        )
                        .unwrap()
                        .progress_chars("=>-"),
                    );
                    pb
                }
                None => {
                    let pb = ProgressBar::new_spinner();
                    pb.set_style(
                        ProgressStyle::with_template("{spinner:.green} {bytes} ({bytes_per_sec})")
                            .unwrap(),
                    );
                    pb
                }
            };
            pb.set_position(downloaded);
            Some(pb)
        } else {
            None
        };

        let mut tries = 0usize;
        'download_attempt: while tries < self.retry_max {
            let mut headers = HeaderMap::new();
            if let Some(from) = range_from {
                headers.insert(RANGE, HeaderValue::from_str(&format!("bytes={}-", from))?);
            }

            let resp = self
                .http
                .get(&file.location)
                .headers(headers)
                .send()
                .with_context(|| format!("failed to request {}", file.location))?;

            let mut resp = resp.error_for_status().context("download request failed")?;
            let mut out = OpenOptions::new()
                .create(true)
                .write(true)
                .append(mode_append)
                .truncate(!mode_append)
                .open(&target)
                .with_context(|| format!("failed to open {}", target.display()))?;

            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = match resp.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        tries += 1;
                        if tries >= self.retry_max {
                            return Err(e).context("download interrupted")?;
                        }

                        // resume
                        out.flush().ok();
                        downloaded = std::fs::metadata(&target)?.len();
                        range_from = Some(downloaded);
                        mode_append = true;
                        if let Some(pb) = &pb {
                            pb.set_position(downloaded);
                        }
                        thread::sleep(self.sleep_max);
                        continue 'download_attempt;
                    }
                };

                out.write_all(&buf[..n])?;
                downloaded += n as u64;
                if let Some(pb) = &pb {
                    pb.inc(n as u64);
                }
            }

            out.flush()?;

            // Without a reported size, a clean EOF is the best completion
            // signal we have.
            let complete = match file.size {
                Some(size) => downloaded >= size,
                None => true,
            };
            if complete {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Ok(target);
            }

            tries += 1;
            // resume and retry
            downloaded = std::fs::metadata(&target)?.len();
            range_from = Some(downloaded);
            mode_append = true;
            if let Some(pb) = &pb {
                pb.set_position(downloaded);
            }
            thread::sleep(self.sleep_max);
        }

        bail!(
            "download of '{}' failed: got {} byte(s) out of {}",
            file.file_name,
            downloaded,
            file.size.unwrap_or(0)
        )
    }
}
