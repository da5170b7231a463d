//! File locators: where a resource lives on disk.
//!
//! A locator stores a normalized, forward-slash path and answers the name
//! questions the manager asks (file name, extensions, directory). Extension
//! queries follow the multi-part convention used by asset files, so
//! `goblin.imageset.xml` has the extension `xml`, the full extension
//! `imageset.xml`, and answers `true` to both `has_extension("xml")` and
//! `has_extension("imageset.xml")`.

use std::fmt;
use std::path::{Path, PathBuf};

const SEPARATOR: char = '/';
const EXTENSION_SEPARATOR: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileLocator {
    path: String,
}

impl FileLocator {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let segments: Vec<&str> = raw
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        let mut path = segments.join("/");
        if raw.starts_with(SEPARATOR) {
            path.insert(0, SEPARATOR);
        }
        Self { path }
    }

    /// Locator for `file_name` inside `directory`.
    pub fn in_directory(directory: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(directory.as_ref().join(file_name))
    }

    /// The full normalized path, directory included.
    pub fn path_name(&self) -> &str {
        &self.path
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// The directory part, without a trailing separator. Empty for bare names.
    pub fn directory(&self) -> &str {
        match self.path.rfind(SEPARATOR) {
            Some(index) => &self.path[..index],
            None => "",
        }
    }

    pub fn file_name(&self) -> &str {
        match self.path.rfind(SEPARATOR) {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }

    /// The file name up to its first extension separator.
    pub fn pretty_name(&self) -> &str {
        let name = self.file_name();
        match name.find(EXTENSION_SEPARATOR) {
            Some(index) => &name[..index],
            None => name,
        }
    }

    /// The last extension (`xml` for `goblin.imageset.xml`).
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rfind(EXTENSION_SEPARATOR) {
            Some(index) => &name[index + 1..],
            None => "",
        }
    }

    /// Every extension after the first separator (`imageset.xml`).
    pub fn all_extensions(&self) -> &str {
        let name = self.file_name();
        match name.find(EXTENSION_SEPARATOR) {
            Some(index) => &name[index + 1..],
            None => "",
        }
    }

    /// Case-insensitive suffix match on a dot boundary.
    pub fn has_extension(&self, extension: &str) -> bool {
        let name = self.file_name();
        if extension.is_empty() || name.len() <= extension.len() {
            return false;
        }
        let split = name.len() - extension.len();
        name.as_bytes()[split - 1] == EXTENSION_SEPARATOR as u8
            && name
                .get(split..)
                .is_some_and(|suffix| suffix.eq_ignore_ascii_case(extension))
    }

    /// Whether this locator lives in `directory` or any of its subdirectories.
    pub fn is_under(&self, directory: &str) -> bool {
        let directory = FileLocator::new(directory);
        let directory = directory.path_name();
        if directory.is_empty() {
            return true;
        }
        self.path
            .strip_prefix(directory)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// The path relative to `root`, if this locator lives under it.
    pub fn relative_to(&self, root: impl AsRef<Path>) -> Option<&str> {
        let root = FileLocator::new(root);
        let root = root.path_name();
        if root.is_empty() {
            return Some(&self.path);
        }
        self.path
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
    }

    pub fn exists(&self) -> bool {
        Path::new(&self.path).is_file()
    }

    /// Delete the file behind this locator.
    pub fn remove_file(&self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }
}

impl fmt::Display for FileLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for FileLocator {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for FileLocator {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators() {
        let loc = FileLocator::new("assets\\ui//./hero.png");
        assert_eq!(loc.path_name(), "assets/ui/hero.png");
        assert_eq!(loc.directory(), "assets/ui");
        assert_eq!(loc.file_name(), "hero.png");
    }

    #[test]
    fn absolute_paths_keep_their_root() {
        let loc = FileLocator::new("/tmp/assets/orc.unit");
        assert_eq!(loc.path_name(), "/tmp/assets/orc.unit");
        assert!(loc.is_under("/tmp/assets"));
        assert_eq!(loc.relative_to("/tmp"), Some("assets/orc.unit"));
    }

    #[test]
    fn multi_part_extensions() {
        let loc = FileLocator::new("assets/goblin.imageset.xml");
        assert_eq!(loc.pretty_name(), "goblin");
        assert_eq!(loc.extension(), "xml");
        assert_eq!(loc.all_extensions(), "imageset.xml");
        assert!(loc.has_extension("xml"));
        assert!(loc.has_extension("imageset.xml"));
        assert!(loc.has_extension("IMAGESET.XML"));
        assert!(!loc.has_extension("set.xml"));
        assert!(!loc.has_extension("goblin.imageset.xml"));
    }

    #[test]
    fn bare_names_have_no_directory() {
        let loc = FileLocator::new("Fireball.skill");
        assert_eq!(loc.directory(), "");
        assert_eq!(loc.file_name(), "Fireball.skill");
        assert_eq!(loc.extension(), "skill");
    }

    #[test]
    fn no_extension() {
        let loc = FileLocator::new("assets/README");
        assert_eq!(loc.extension(), "");
        assert_eq!(loc.all_extensions(), "");
        assert!(!loc.has_extension(""));
    }

    #[test]
    fn directory_containment() {
        let loc = FileLocator::new("assets/sheets/units/orc.unit");
        assert!(loc.is_under("assets/sheets"));
        assert!(loc.is_under("assets/sheets/"));
        assert!(!loc.is_under("assets/she"));
        assert_eq!(loc.relative_to("assets"), Some("sheets/units/orc.unit"));
        assert_eq!(loc.relative_to("other"), None);
    }
}
