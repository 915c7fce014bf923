use std::borrow::Cow;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Extensions accepted by default: plain and gzipped FASTA/FASTQ.
pub const DEFAULT_EXTENSIONS: [&str; 6] = [".fa", ".fasta", ".fna", ".gz", ".fq", ".fastq"];

/// Something the user picked that can be sent to the worker.
///
/// The name is the join key for progress, results and errors.
pub trait FileHandle {
    fn name(&self) -> Cow<'_, str>;
}

impl FileHandle for String {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl FileHandle for &str {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

/// Paths are keyed by their final component, like browser `File`s.
impl FileHandle for Utf8PathBuf {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.file_name().unwrap_or(self.as_str()))
    }
}

impl FileHandle for &Utf8Path {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.file_name().unwrap_or(self.as_str()))
    }
}

#[cfg(feature = "web")]
impl FileHandle for web_sys::File {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(web_sys::File::name(self))
    }
}

/// Ordered list of filename suffixes a selection is filtered with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ExtensionAllowlist(Vec<String>);

impl Default for ExtensionAllowlist {
    fn default() -> ExtensionAllowlist {
        ExtensionAllowlist::new(DEFAULT_EXTENSIONS)
    }
}

impl ExtensionAllowlist {
    pub fn new<I, S>(extensions: I) -> ExtensionAllowlist
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExtensionAllowlist(extensions.into_iter().map(Into::into).collect())
    }

    /// Parse a comma separated list, e.g. `".fa, .fasta.gz"`.
    ///
    /// Entries without a leading dot get one.
    pub fn from_csv(list: &str) -> ExtensionAllowlist {
        ExtensionAllowlist(
            list.split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(|ext| {
                    if ext.starts_with('.') {
                        ext.to_string()
                    } else {
                        format!(".{}", ext)
                    }
                })
                .collect(),
        )
    }

    pub fn extensions(&self) -> &[String] {
        &self.0
    }

    pub fn accepts(&self, filename: &str) -> bool {
        self.0.iter().any(|ext| filename.ends_with(ext.as_str()))
    }

    /// Value for the `accept` attribute of a file input.
    pub fn accept_attribute(&self) -> String {
        self.0.iter().join(",")
    }

    /// Keep only accepted files, preserving order.
    pub fn filter_files<F, I>(&self, files: I) -> Vec<F>
    where
        F: FileHandle,
        I: IntoIterator<Item = F>,
    {
        files
            .into_iter()
            .filter(|file| self.accepts(&file.name()))
            .collect()
    }
}

impl fmt::Display for ExtensionAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.iter().join(", "))
    }
}

cfg_if::cfg_if! {
    if #[cfg(not(target_arch = "wasm32"))] {
        use std::fs;
        use std::io;

        /// Expand command line inputs into files, the way a folder picker does.
        ///
        /// Directories are walked recursively and their files added in path
        /// order. Plain files are kept in argument order.
        pub fn collect_paths<I, P>(inputs: I) -> io::Result<Vec<Utf8PathBuf>>
        where
            I: IntoIterator<Item = P>,
            P: AsRef<Utf8Path>,
        {
            let mut paths = vec![];
            for input in inputs {
                let input = input.as_ref();
                if input.is_dir() {
                    walk_dir(input, &mut paths)?;
                } else {
                    paths.push(input.to_path_buf());
                }
            }
            Ok(paths)
        }

        fn walk_dir(dir: &Utf8Path, paths: &mut Vec<Utf8PathBuf>) -> io::Result<()> {
            let mut entries = vec![];
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                match Utf8PathBuf::from_path_buf(path) {
                    Ok(path) => entries.push(path),
                    Err(path) => log::warn!("skipping non UTF-8 path {}", path.display()),
                }
            }
            entries.sort();

            for entry in entries {
                if entry.is_dir() {
                    walk_dir(&entry, paths)?;
                } else {
                    paths.push(entry);
                }
            }
            Ok(())
        }
    }
}
