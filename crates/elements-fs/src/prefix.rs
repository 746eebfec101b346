/// Maps adapter-relative paths onto store paths under a fixed prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Store path for an adapter-relative `path`.
    ///
    /// The adapter root maps to the prefix itself, so with an empty prefix
    /// it stays the empty path that denotes the store root.
    pub fn prefix_path(&self, path: &str) -> String {
        let relative = path.trim_start_matches('/');
        if self.prefix.is_empty() {
            relative.to_string()
        } else if relative.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, relative)
        }
    }

    /// Adapter-relative path for a store path. Paths outside the prefix are
    /// returned unchanged.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return path;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => "",
            Some(rest) if rest.starts_with('/') => &rest[1..],
            _ => path,
        }
    }
}
