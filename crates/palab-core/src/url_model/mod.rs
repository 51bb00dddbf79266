//! Local filenames for downloaded files.
//!
//! Hub repository files may live in subdirectories (`data/train-00000.parquet`)
//! and plain URLs end in arbitrary path segments; both are flattened into a
//! single sanitized name inside the asset directory.

mod sanitize;

use std::collections::HashSet;

use sanitize::NAME_MAX;

pub use sanitize::sanitize_filename_for_linux;

/// Default filename when nothing usable can be derived.
const DEFAULT_FILENAME: &str = "download.bin";

/// Local name for a repository file path: separators become `_`.
/// Distinct paths can flatten to the same name (`a/b.txt`, `a_b.txt`);
/// [`LocalNames`] resolves that within one directory.
///
/// - `local_file_name("train.jsonl")` → `"train.jsonl"`
/// - `local_file_name("data/train-00000.parquet")` → `"data_train-00000.parquet"`
pub fn local_file_name(repo_path: &str) -> String {
    non_empty_or_default(sanitize_filename_for_linux(repo_path))
}

/// Hands out flattened names for one directory, never the same name twice.
/// A repeated name gets `-2`, `-3`, ... before its extension.
#[derive(Debug, Default)]
pub struct LocalNames {
    taken: HashSet<String>,
}

impl LocalNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, repo_path: &str) -> String {
        let name = local_file_name(repo_path);
        if self.taken.insert(name.clone()) {
            return name;
        }
        let (stem, ext) = split_extension(&name);
        let mut n = 2u32;
        loop {
            let suffix = format!("-{}", n);
            let mut stem = stem.to_string();
            while !stem.is_empty() && stem.len() + suffix.len() + ext.len() > NAME_MAX {
                stem.pop();
            }
            let candidate = format!("{}{}{}", stem, suffix, ext);
            if self.taken.insert(candidate.clone()) {
                tracing::debug!(repo_path, local = %candidate, "renamed colliding local file name");
                return candidate;
            }
            n += 1;
        }
    }
}

/// `("clips", ".tar.gz")` for `clips.tar.gz`; a leading dot is not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.char_indices().skip(1).find(|&(_, c)| c == '.') {
        Some((i, _)) => name.split_at(i),
        None => (name, ""),
    }
}

/// Local name for an arbitrary URL: the sanitized last path segment.
pub fn derive_filename(url: &str) -> String {
    let raw = filename_from_url_path(url).unwrap_or_default();
    non_empty_or_default(sanitize_filename_for_linux(&raw))
}

/// Last non-empty path segment of `url`, if it parses.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(segment.to_string())
}

fn non_empty_or_default(name: String) -> String {
    if name.is_empty() || name == "." || name == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_paths_are_flattened() {
        assert_eq!(local_file_name("train.jsonl"), "train.jsonl");
        assert_eq!(
            local_file_name("data/train-00000-of-00002.parquet"),
            "data_train-00000-of-00002.parquet"
        );
    }

    #[test]
    fn unusable_names_fall_back() {
        assert_eq!(local_file_name(""), "download.bin");
        assert_eq!(local_file_name("/"), "download.bin");
        assert_eq!(local_file_name(".."), "download.bin");
    }

    #[test]
    fn flattened_duplicates_get_distinct_names() {
        let mut names = LocalNames::new();
        assert_eq!(names.allocate("data/x.jsonl"), "data_x.jsonl");
        assert_eq!(names.allocate("data_x.jsonl"), "data_x-2.jsonl");
        assert_eq!(names.allocate("data_x-2.jsonl"), "data_x-2-2.jsonl");
        assert_eq!(names.allocate("data//x.jsonl"), "data_x-3.jsonl");
        assert_eq!(names.allocate("clips.tar.gz"), "clips.tar.gz");
        assert_eq!(names.allocate("clips.tar.gz"), "clips-2.tar.gz");
        assert_eq!(names.allocate("README"), "README");
        assert_eq!(names.allocate("README"), "README-2");
    }

    #[test]
    fn renamed_long_names_stay_within_name_limit() {
        let long = format!("{}.bin", "a".repeat(250));
        let mut names = LocalNames::new();
        let first = names.allocate(&long);
        let second = names.allocate(&long);
        assert_ne!(first, second);
        assert!(second.len() <= 255);
        assert!(second.ends_with("-2.bin"));
    }

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename("https://huggingface.co/org/m/resolve/main/model.onnx"),
            "model.onnx"
        );
        assert_eq!(derive_filename("https://example.com/"), "download.bin");
        assert_eq!(derive_filename("not a url"), "download.bin");
    }

    #[test]
    fn url_segment_ignores_query_and_trailing_slash() {
        assert_eq!(
            filename_from_url_path("https://cdn.test/a/b/clips.tar?download=1").as_deref(),
            Some("clips.tar")
        );
        assert_eq!(
            filename_from_url_path("https://cdn.test/a/b/").as_deref(),
            Some("b")
        );
        assert_eq!(filename_from_url_path("https://cdn.test"), None);
    }
}
