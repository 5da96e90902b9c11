//! CIFS mount lifecycle
//!
//! When the configuration names an SMB host, the share is mounted with
//! `mount -t cifs` for the duration of the run and unmounted on drop. A mount
//! point that is already mounted (fstab, autofs) is used as is. Dry runs only
//! ever use an existing mount.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::bounded::with_deadline;
use super::{BoundedShare, MountedShare};
use crate::config::Upload;
use crate::error::{BackupError, BackupResult};

/// A mounted share, unmounted on drop if this process mounted it
#[derive(Debug)]
pub struct ShareMount {
    mount_point: PathBuf,
    owned: bool,
    timeout: Duration,
}

impl ShareMount {
    /// Make the configured share available at its mount point
    ///
    /// Without an `smbhost`, the mount point is expected to be provisioned
    /// already and must be an existing directory.
    pub fn attach(upload: &Upload) -> BackupResult<Self> {
        if let Some(mount) = Self::reuse(upload)? {
            return Ok(mount);
        }

        let mount_point = upload.mount_point();
        let timeout = upload.timeout();

        std::fs::create_dir_all(&mount_point).map_err(|e| {
            BackupError::Remote(format!(
                "Failed to create mount point {}: {}",
                mount_point.display(),
                e
            ))
        })?;

        let mut cmd = mount_command(upload, &mount_point);
        let source = upload.unc_path();
        with_deadline(format!("mount {}", source), timeout, move || {
            let output = cmd
                .output()
                .map_err(|e| BackupError::tool("mount", e.to_string()))?;
            if output.status.success() {
                Ok(())
            } else {
                Err(BackupError::Remote(format!(
                    "mount {} failed: {}",
                    source,
                    String::from_utf8_lossy(&output.stderr).trim()
                )))
            }
        })?;

        tracing::info!(
            share = %upload.unc_path(),
            mount_point = %mount_point.display(),
            "mounted share"
        );

        Ok(Self {
            mount_point,
            owned: true,
            timeout,
        })
    }

    /// Use the share only if it is already available; never runs `mount`
    pub fn existing(upload: &Upload) -> BackupResult<Self> {
        Self::reuse(upload)?.ok_or_else(|| {
            BackupError::Remote(format!(
                "{} is not mounted at {}",
                upload.unc_path(),
                upload.mount_point().display()
            ))
        })
    }

    /// A provisioned directory or an existing mount, if there is one
    fn reuse(upload: &Upload) -> BackupResult<Option<Self>> {
        let mount_point = upload.mount_point();
        let unowned = |mount_point| Self {
            mount_point,
            owned: false,
            timeout: upload.timeout(),
        };

        if upload.smb_host.is_empty() {
            if !mount_point.is_dir() {
                return Err(BackupError::Remote(format!(
                    "No smbhost configured and {} is not a directory",
                    mount_point.display()
                )));
            }
            return Ok(Some(unowned(mount_point)));
        }

        if is_mount_point(&mount_point) {
            tracing::info!(mount_point = %mount_point.display(), "share already mounted");
            return Ok(Some(unowned(mount_point)));
        }

        Ok(None)
    }

    /// Get the mount point
    pub fn path(&self) -> &Path {
        &self.mount_point
    }

    /// Open a deadline-bounded session on the mounted share
    pub fn session(&self) -> BoundedShare<MountedShare> {
        BoundedShare::new(MountedShare::new(&self.mount_point), self.timeout)
    }
}

impl Drop for ShareMount {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }

        let mount_point = self.mount_point.clone();
        let result = with_deadline(
            format!("umount {}", mount_point.display()),
            self.timeout,
            move || {
                let status = Command::new("umount")
                    .arg(&mount_point)
                    .status()
                    .map_err(|e| BackupError::tool("umount", e.to_string()))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(BackupError::tool("umount", status.to_string()))
                }
            },
        );

        if let Err(e) = result {
            tracing::warn!(
                mount_point = %self.mount_point.display(),
                error = %e,
                "failed to unmount share"
            );
        }
    }
}

/// Build the `mount -t cifs` invocation
///
/// The password travels in the `PASSWD` environment variable understood by
/// mount.cifs so that it never appears in the process list.
fn mount_command(upload: &Upload, mount_point: &Path) -> Command {
    let mut options = vec![format!("username={}", upload.smb_user)];
    if !upload.domain.is_empty() {
        options.push(format!("domain={}", upload.domain));
    }

    let mut cmd = Command::new("mount");
    cmd.arg("-t")
        .arg("cifs")
        .arg(upload.unc_path())
        .arg(mount_point)
        .arg("-o")
        .arg(options.join(","));

    if !upload.smb_password.is_empty() {
        cmd.env("PASSWD", upload.smb_password.expose());
    }

    cmd
}

/// Whether a path is the root of a mounted filesystem
#[cfg(unix)]
fn is_mount_point(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    match path.parent().map(std::fs::metadata) {
        Some(Ok(parent)) => parent.dev() != metadata.dev(),
        Some(Err(_)) => false,
        None => true,
    }
}

#[cfg(not(unix))]
fn is_mount_point(path: &Path) -> bool {
    path.is_dir()
}
