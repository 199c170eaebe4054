use std::fmt;

/// An absolute, normalised path inside the user's virtual root.
///
/// Always starts with `/`, never contains `.`/`..` components, empty
/// components or a trailing slash (except for the root itself). `..` at the
/// root stays at the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(String);

impl VirtualPath {
    pub fn root() -> Self {
        VirtualPath("/".to_string())
    }

    /// Normalises `path`, interpreting it from the root.
    pub fn parse(path: &str) -> Self {
        Self::root().join(path)
    }

    /// Resolves `arg` against `self`. Absolute arguments start over at the root.
    pub fn join(&self, arg: &str) -> Self {
        let mut components: Vec<&str> = if arg.starts_with('/') {
            Vec::new()
        } else {
            self.components().collect()
        };

        for part in arg.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                other => components.push(other),
            }
        }

        if components.is_empty() {
            Self::root()
        } else {
            VirtualPath(format!("/{}", components.join("/")))
        }
    }

    pub fn parent(&self) -> Self {
        self.join("..")
    }

    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path relative to the root, without the leading slash.
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|part| !part.is_empty())
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
