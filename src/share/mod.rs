// db-tools/src/share/mod.rs
use anyhow::{Context, Result};
use pavao::{SmbClient, SmbCredentials, SmbOpenOptions, SmbOptions};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

use crate::config::ShareParams;

/// An authenticated session against one SMB share.
///
/// The underlying connection is closed when the session is dropped; remote
/// file handles are scoped to the individual transfer calls.
pub struct ShareSession {
    client: SmbClient,
    host: String,
    share: String,
}

impl ShareSession {
    /// Connects and authenticates to the share described by `params`.
    pub fn connect(params: &ShareParams) -> Result<Self> {
        info!(
            "connecting to share {}",
            unc_path(&params.host, &params.share, "")
        );

        let client = SmbClient::new(
            SmbCredentials::default()
                .server(format!("smb://{}", params.host))
                .share(share_root(&params.share))
                .username(&params.user)
                .password(&params.password),
            SmbOptions::default().one_share_per_server(true),
        )
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to share {}: {}",
                unc_path(&params.host, &params.share, ""),
                e
            )
        })?;

        Ok(ShareSession {
            client,
            host: params.host.clone(),
            share: params.share.clone(),
        })
    }

    /// Streams a local file to `remote_name` on the share.
    ///
    /// Returns the number of bytes copied.
    pub fn upload(&self, local_path: &Path, remote_name: &str) -> Result<u64> {
        let target = unc_path(&self.host, &self.share, remote_name);
        info!("uploading {} to {}", local_path.display(), target);

        let mut local = File::open(local_path)
            .with_context(|| format!("Failed to open {} for upload", local_path.display()))?;
        let mut remote = self
            .client
            .open_with(
                remote_file_path(remote_name),
                SmbOpenOptions::default().create(true).write(true),
            )
            .map_err(|e| anyhow::anyhow!("Failed to open {} for writing: {}", target, e))?;

        let bytes = io::copy(&mut local, &mut remote)
            .with_context(|| format!("Failed while uploading to {}", target))?;

        info!("uploaded {} bytes to {}", bytes, target);
        Ok(bytes)
    }

    /// Streams `remote_name` from the share into a local file.
    ///
    /// Returns the number of bytes copied.
    pub fn download(&self, remote_name: &str, local_path: &Path) -> Result<u64> {
        let source = unc_path(&self.host, &self.share, remote_name);
        info!("downloading {} to {}", source, local_path.display());

        let mut remote = self
            .client
            .open_with(remote_file_path(remote_name), SmbOpenOptions::default().read(true))
            .map_err(|e| anyhow::anyhow!("Failed to open {} for reading: {}", source, e))?;
        let mut local = File::create(local_path)
            .with_context(|| format!("Failed to create {}", local_path.display()))?;

        let bytes = io::copy(&mut remote, &mut local)
            .with_context(|| format!("Failed while downloading {}", source))?;

        info!("downloaded {} bytes to {}", bytes, local_path.display());
        Ok(bytes)
    }
}

/// Share name as the client expects it, with exactly one leading slash.
fn share_root(share: &str) -> String {
    format!("/{}", share.trim_start_matches(['/', '\\']))
}

/// Path of a file relative to the share root.
fn remote_file_path(name: &str) -> String {
    format!("/{}", name.trim_start_matches(['/', '\\']))
}

/// UNC-style rendering of a remote location, used for log and error text.
fn unc_path(host: &str, share: &str, name: &str) -> String {
    let mut path = format!(r"\\{}\{}", host, share.trim_start_matches(['/', '\\']));
    if !name.is_empty() {
        path.push('\\');
        path.push_str(name.trim_start_matches(['/', '\\']));
    }
    path
}
