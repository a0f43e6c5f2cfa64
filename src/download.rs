use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::client::Client;
use crate::reply::DownloadHandle;
use crate::util::guess_filename_from_url;

impl Client {
    /// Fetches the file behind a download handle into `target`.
    ///
    /// An empty `target`, an existing directory or a path ending in a separator
    /// gets a file named after the URL. Data is written to a `.part` sibling and
    /// renamed into place once complete; a failed transfer leaves nothing behind.
    /// The API token is not sent: download URLs are pre-authorized and usually
    /// live on a different host.
    pub fn download(&self, handle: &DownloadHandle, target: &Path) -> Result<PathBuf> {
        let target = resolve_target(target, &handle.url);

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let mut resp = self
            .http
            .get(&handle.url)
            .send()
            .with_context(|| format!("could not connect to {}", handle.url))?
            .error_for_status()
            .context("download request failed")?;

        let pb = if self.progress {
            let pb = match resp.content_length() {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                )
                .context("invalid progress template")?
                .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let downloaded = write_in_place(&target, |out| {
            let mut downloaded: u64 = 0;
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = resp.read(&mut buf).context("download interrupted")?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
                downloaded += n as u64;
                if let Some(pb) = &pb {
                    pb.inc(n as u64);
                }
            }
            Ok(downloaded)
        });

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let downloaded = downloaded?;

        info!(path = %target.display(), bytes = downloaded, "download complete");
        Ok(target)
    }
}

fn resolve_target(target: &Path, url: &str) -> PathBuf {
    let file_name = || {
        guess_filename_from_url(url)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("download"))
    };
    let names_dir = target
        .as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator);

    if target.as_os_str().is_empty() {
        file_name()
    } else if names_dir || target.is_dir() {
        target.join(file_name())
    } else {
        target.to_path_buf()
    }
}

/// Runs `fill` against `<target>.part` and renames it to `target` on success.
/// On failure the partial file is removed.
fn write_in_place<F>(target: &Path, fill: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<u64>,
{
    let mut part = target.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let file =
        File::create(&part).with_context(|| format!("failed to open {}", part.display()))?;
    let mut out = BufWriter::new(file);

    let result = fill(&mut out).and_then(|n| {
        out.flush()?;
        Ok(n)
    });
    drop(out);

    match result {
        Ok(n) => {
            std::fs::rename(&part, target).with_context(|| {
                format!("failed to move {} to {}", part.display(), target.display())
            })?;
            Ok(n)
        }
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(&part) {
                warn!(path = %part.display(), "could not remove partial download: {rm}");
            }
            Err(e.context(format!("partial download of {} discarded", target.display())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn target_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://dds.example/ls/LC08.tar?sig=1";

        assert_eq!(resolve_target(Path::new(""), url), PathBuf::from("LC08.tar"));
        assert_eq!(resolve_target(dir.path(), url), dir.path().join("LC08.tar"));
        assert_eq!(
            resolve_target(&dir.path().join("new/"), url),
            dir.path().join("new").join("LC08.tar")
        );
        assert_eq!(
            resolve_target(&dir.path().join("la.tar"), url),
            dir.path().join("la.tar")
        );
        assert_eq!(
            resolve_target(Path::new(""), "https://dds.example/"),
            PathBuf::from("download")
        );
    }

    #[test]
    fn failed_fill_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scene.tar");

        let err = write_in_place(&target, |out| {
            out.write_all(b"half a scene")?;
            Err(anyhow!("connection reset"))
        })
        .unwrap_err();

        assert!(format!("{err:#}").contains("connection reset"));
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn successful_fill_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scene.tar");
        std::fs::write(&target, b"old").unwrap();

        let n = write_in_place(&target, |out| {
            out.write_all(b"new scene")?;
            Ok(9)
        })
        .unwrap();

        assert_eq!(n, 9);
        assert_eq!(std::fs::read(&target).unwrap(), b"new scene");
        assert!(!dir.path().join("scene.tar.part").exists());
    }
}
