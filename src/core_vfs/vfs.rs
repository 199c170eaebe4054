use crate::core_acl::wildcard_match;
use crate::core_vfs::error::FsError;
use crate::core_vfs::listing::DirEntry;
use crate::core_vfs::path::VirtualPath;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Cwd,
    Download,
    Upload,
    Makedir,
    Delete,
    Rename,
    Hideowner,
}

impl Capability {
    /// Outcome when no rule matches.
    fn default_allow(self) -> bool {
        !matches!(self, Capability::Hideowner)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::View => "view",
            Capability::Cwd => "cwd",
            Capability::Download => "download",
            Capability::Upload => "upload",
            Capability::Makedir => "makedir",
            Capability::Delete => "delete",
            Capability::Rename => "rename",
            Capability::Hideowner => "hideowner",
        };
        f.write_str(name)
    }
}

/// One `[[path_rules]]` entry.
///
/// `path` is a wildcard over virtual paths; directories are matched with a
/// trailing slash, so `/private/*` covers the directory `/private` as well as
/// everything below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRule {
    pub path: String,
    pub capability: Capability,
    #[serde(default = "default_rule_users")]
    pub users: Vec<String>,
    #[serde(default)]
    pub allow: bool,
}

fn default_rule_users() -> Vec<String> {
    vec!["*".to_string()]
}

impl PathRule {
    fn applies(&self, user: &str, path: &VirtualPath, is_dir: bool, capability: Capability) -> bool {
        if self.capability != capability {
            return false;
        }
        if !self.users.iter().any(|mask| wildcard_match(mask, user, false)) {
            return false;
        }
        if wildcard_match(&self.path, path.as_str(), false) {
            return true;
        }
        is_dir && !path.is_root() && wildcard_match(&self.path, &format!("{}/", path), false)
    }
}

/// The local directory tree served to clients, rooted at
/// `chroot_dir/min_homedir`.
#[derive(Debug, Clone)]
pub struct Vfs {
    root: PathBuf,
    rules: Vec<PathRule>,
}

impl Vfs {
    pub fn new(root: impl Into<PathBuf>, rules: Vec<PathRule>) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    pub fn from_config(chroot_dir: &str, min_homedir: &str, rules: Vec<PathRule>) -> Self {
        let root = PathBuf::from(chroot_dir).join(min_homedir.trim_start_matches('/'));
        Self::new(root, rules)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First matching rule wins.
    pub fn allowed(
        &self,
        user: &str,
        path: &VirtualPath,
        is_dir: bool,
        capability: Capability,
    ) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.applies(user, path, is_dir, capability))
            .map(|rule| rule.allow)
            .unwrap_or_else(|| capability.default_allow())
    }

    pub fn check(
        &self,
        user: &str,
        path: &VirtualPath,
        is_dir: bool,
        capability: Capability,
    ) -> Result<(), FsError> {
        if self.allowed(user, path, is_dir, capability) {
            Ok(())
        } else {
            debug!("{} denied {} on {}", user, capability, path);
            Err(FsError::PermissionDenied)
        }
    }

    /// Maps a virtual path onto the local filesystem.
    ///
    /// The deepest existing ancestor is canonicalised and has to stay under
    /// the canonical root, so symlinks cannot lead outside it.
    pub async fn real_path(&self, path: &VirtualPath) -> Result<PathBuf, FsError> {
        let real = self.root.join(path.relative());
        let root = fs::canonicalize(&self.root).await?;

        let mut probe = real.as_path();
        let resolved = loop {
            match fs::canonicalize(probe).await {
                Ok(resolved) => break resolved,
                Err(_) => match probe.parent() {
                    Some(parent) => probe = parent,
                    None => return Err(FsError::NotFound),
                },
            }
        };

        if !resolved.starts_with(&root) {
            warn!("Path is outside of the allowed area: {:?}", resolved);
            return Err(FsError::PermissionDenied);
        }
        Ok(real)
    }

    pub async fn is_dir(&self, path: &VirtualPath) -> bool {
        match self.real_path(path).await {
            Ok(real) => fs::metadata(real)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn change_dir(&self, user: &str, path: &VirtualPath) -> Result<(), FsError> {
        let real = self.real_path(path).await?;
        let meta = fs::metadata(&real).await?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory);
        }
        self.check(user, path, true, Capability::Cwd)
    }

    pub async fn make_dir(&self, user: &str, path: &VirtualPath) -> Result<(), FsError> {
        self.check(user, path, true, Capability::Makedir)?;
        let real = self.real_path(path).await?;
        fs::create_dir(&real).await?;
        Ok(())
    }

    pub async fn remove_dir(&self, user: &str, path: &VirtualPath) -> Result<(), FsError> {
        self.check(user, path, true, Capability::Delete)?;
        let real = self.real_path(path).await?;
        if !fs::metadata(&real).await?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        fs::remove_dir(&real).await?;
        Ok(())
    }

    pub async fn delete_file(&self, user: &str, path: &VirtualPath) -> Result<(), FsError> {
        self.check(user, path, false, Capability::Delete)?;
        let real = self.real_path(path).await?;
        if !fs::metadata(&real).await?.is_file() {
            return Err(FsError::NotAFile);
        }
        fs::remove_file(&real).await?;
        Ok(())
    }

    pub async fn rename(
        &self,
        user: &str,
        from: &VirtualPath,
        to: &VirtualPath,
    ) -> Result<(), FsError> {
        let from_real = self.real_path(from).await?;
        let is_dir = fs::metadata(&from_real).await?.is_dir();
        self.check(user, from, is_dir, Capability::Rename)?;
        self.check(user, to, is_dir, Capability::Rename)?;

        let to_real = self.real_path(to).await?;
        if fs::try_exists(&to_real).await? {
            return Err(FsError::AlreadyExists);
        }
        fs::rename(&from_real, &to_real).await?;
        Ok(())
    }

    /// Existence check for RNFR.
    pub async fn exists(&self, path: &VirtualPath) -> Result<(), FsError> {
        let real = self.real_path(path).await?;
        fs::metadata(&real).await?;
        Ok(())
    }

    pub async fn file_metadata(&self, path: &VirtualPath) -> Result<std::fs::Metadata, FsError> {
        let real = self.real_path(path).await?;
        let meta = fs::metadata(&real).await?;
        if !meta.is_file() {
            return Err(FsError::NotAFile);
        }
        Ok(meta)
    }

    pub async fn open_read(&self, user: &str, path: &VirtualPath) -> Result<fs::File, FsError> {
        self.check(user, path, false, Capability::Download)?;
        self.file_metadata(path).await?;
        let real = self.real_path(path).await?;
        Ok(fs::File::open(&real).await?)
    }

    /// Creates a new file for upload. Existing files are never overwritten.
    pub async fn create_write(&self, user: &str, path: &VirtualPath) -> Result<fs::File, FsError> {
        self.check(user, path, false, Capability::Upload)?;
        let real = self.real_path(path).await?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&real)
            .await?;
        Ok(file)
    }

    /// Removes a partial upload after a failed transfer.
    pub async fn discard(&self, path: &VirtualPath) {
        if let Ok(real) = self.real_path(path).await {
            if let Err(e) = fs::remove_file(&real).await {
                warn!("Failed to remove partial upload {:?}: {}", real, e);
            }
        }
    }

    /// Entries of `path` the user may see, sorted by name.
    pub async fn list(&self, user: &str, path: &VirtualPath) -> Result<Vec<DirEntry>, FsError> {
        let real = self.real_path(path).await?;
        if !fs::metadata(&real).await?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if !self.allowed(user, path, true, Capability::View) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut reader = fs::read_dir(&real).await?;
        while let Some(item) = reader.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            let meta = match item.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("Skipping {:?}: {}", item.path(), e);
                    continue;
                }
            };
            let child = path.join(&name);
            let is_dir = meta.is_dir();
            if !self.allowed(user, &child, is_dir, Capability::View) {
                continue;
            }
            let hide_owner = self.allowed(user, &child, is_dir, Capability::Hideowner);
            entries.push(DirEntry::from_metadata(name, &meta, hide_owner));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
