//! Deterministic placement of output Markdown and OCR artifacts.
//!
//! Every path here is a pure function of the input's path relative to the
//! processing root, so the same input always maps to the same output and
//! re-runs can tell whether an output already exists.
//!
//! ```text
//! a/b/report.pdf ──▶ <root>/MD_Folder/a__b__report.md
//!                ──▶ <root>/OCR/a/b/report_ocr.pdf
//! ```

use std::path::{Component, Path, PathBuf};

/// Separator substituted for `/` when flattening a relative path.
pub const FLATTEN_SEPARATOR: &str = "__";

/// Suffix appended to the stem of an OCR'd PDF.
pub const OCR_SUFFIX: &str = "_ocr.pdf";

/// Resolved output folders for one processing root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    md_dir: PathBuf,
    ocr_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path, md_folder: &str, ocr_folder: &str) -> Self {
        Self {
            md_dir: root.join(md_folder),
            ocr_dir: root.join(ocr_folder),
        }
    }

    pub fn md_dir(&self) -> &Path {
        &self.md_dir
    }

    pub fn ocr_dir(&self) -> &Path {
        &self.ocr_dir
    }

    /// Markdown output path for a `/`-separated relative input path.
    pub fn markdown_path(&self, rel_path: &str) -> PathBuf {
        self.md_dir.join(markdown_file_name(rel_path))
    }

    /// OCR artifact path, mirroring the input's directory under the OCR folder.
    pub fn ocr_path(&self, rel_path: &str) -> PathBuf {
        let (dir, file_name) = split_rel(rel_path);
        let mut path = self.ocr_dir.clone();
        for part in dir.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path.push(format!("{}{}", file_stem(file_name), OCR_SUFFIX));
        path
    }
}

/// Path of `path` relative to `root`, with `/` separators.
///
/// Returns `None` when `path` is not under `root` or when the relative part
/// contains `..`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Replace every path separator in `rel_path` with [`FLATTEN_SEPARATOR`].
pub fn flatten(rel_path: &str) -> String {
    rel_path
        .replace('\\', FLATTEN_SEPARATOR)
        .replace('/', FLATTEN_SEPARATOR)
}

/// Flattened Markdown file name: directories joined with `__`, the file's own
/// extension replaced by `.md`.
///
/// Only the final component's extension is replaced, so a dot inside a
/// directory name never truncates the name.
pub fn markdown_file_name(rel_path: &str) -> String {
    let (dir, file_name) = split_rel(rel_path);
    let stem = file_stem(file_name);
    if dir.is_empty() {
        format!("{stem}.md")
    } else {
        format!("{}{}{stem}.md", flatten(dir), FLATTEN_SEPARATOR)
    }
}

fn split_rel(rel_path: &str) -> (&str, &str) {
    match rel_path.rfind('/') {
        Some(idx) => (&rel_path[..idx], &rel_path[idx + 1..]),
        None => ("", rel_path),
    }
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OutputLayout {
        OutputLayout::new(Path::new("/data"), "MD_Folder", "OCR")
    }

    #[test]
    fn nested_pdf_output_is_flattened() {
        assert_eq!(
            layout().markdown_path("a/b/report.pdf"),
            PathBuf::from("/data/MD_Folder/a__b__report.md")
        );
    }

    #[test]
    fn nested_pdf_ocr_path_mirrors_directories() {
        assert_eq!(
            layout().ocr_path("a/b/report.pdf"),
            PathBuf::from("/data/OCR/a/b/report_ocr.pdf")
        );
    }

    #[test]
    fn top_level_files() {
        assert_eq!(markdown_file_name("x.pdf"), "x.md");
        assert_eq!(layout().ocr_path("x.pdf"), PathBuf::from("/data/OCR/x_ocr.pdf"));
    }

    #[test]
    fn only_last_extension_is_replaced() {
        assert_eq!(markdown_file_name("v1.2/notes.txt"), "v1.2__notes.md");
        assert_eq!(markdown_file_name("archive.tar.gz"), "archive.tar.md");
    }

    #[test]
    fn files_without_extension_get_md() {
        assert_eq!(markdown_file_name("docs/LICENSE"), "docs__LICENSE.md");
        assert_eq!(markdown_file_name(".hidden"), ".hidden.md");
    }

    #[test]
    fn flatten_replaces_both_separators() {
        assert_eq!(flatten("a/b\\c"), "a__b__c");
    }

    #[test]
    fn known_collision_is_deterministic() {
        // Distinct inputs can share a flattened name; the batch driver detects this.
        assert_eq!(markdown_file_name("a/b.pdf"), markdown_file_name("a__b.pdf"));
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/data");
        let path = root.join("a").join("b").join("report.pdf");
        assert_eq!(relative_path(root, &path).as_deref(), Some("a/b/report.pdf"));
    }

    #[test]
    fn relative_path_outside_root_is_none() {
        assert_eq!(relative_path(Path::new("/data"), Path::new("/other/x.pdf")), None);
        assert_eq!(relative_path(Path::new("/data"), Path::new("/data")), None);
    }
}
