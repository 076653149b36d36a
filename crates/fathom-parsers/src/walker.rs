use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::registry::LanguageRegistry;

pub struct WalkEntry {
    pub path: PathBuf,
    pub language: &'static str,
}

pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    /// Creates a new file walker rooted at the given directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Walks the root directory and returns all recognized source files,
    /// respecting gitignore and `.fathomignore`.
    pub fn walk(&self, registry: &LanguageRegistry) -> Vec<WalkEntry> {
        let mut entries = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .add_custom_ignore_filename(".fathomignore")
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.into_path();
            let config = path
                .to_str()
                .and_then(|p| registry.config_for_path(p));
            if let Some(config) = config {
                entries.push(WalkEntry {
                    path,
                    language: config.name,
                });
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}
