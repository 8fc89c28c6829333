//! HTML file listing shown on the not-found page.
//!
//! Walks the served root, keeps every `.html` file, sorts the paths
//! component by component and renders one depth-annotated link per file.
//! The listing is rebuilt on every call and never cached.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Extension of the files that appear in the listing.
const LISTED_EXTENSION: &str = "html";

/// Bytes escaped in an href path segment so that the content server decodes
/// it back to the file name.
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build the link list for every `.html` file below `root`.
///
/// Subtrees that cannot be read are logged and skipped; the listing is built
/// from whatever could be traversed.
pub fn build_listing(root: &Path) -> String {
    let mut files = collect_html_files(root);
    files.sort_by(|a, b| compare_paths(a, b));
    render(root, &files)
}

/// Collect the absolute paths of all `.html` files below `root`.
///
/// Symlinks are followed, but entries whose target lies outside `root` are
/// left out.
pub fn collect_html_files(root: &Path) -> Vec<PathBuf> {
    let real_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable path while listing {}: {}", root.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()) == Some(LISTED_EXTENSION)
        })
        .filter(|entry| {
            entry
                .path()
                .canonicalize()
                .is_ok_and(|real| real.starts_with(&real_root))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Order paths hierarchically rather than as flat strings.
///
/// Segments are compared one at a time. When two paths share a directory and
/// only one of them ends there, the file sorts before the deeper path, so a
/// directory's own pages come ahead of its subdirectories.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a_segments: Vec<_> = a.components().collect();
    let b_segments: Vec<_> = b.components().collect();

    for (index, (left, right)) in a_segments.iter().zip(&b_segments).enumerate() {
        if left == right {
            continue;
        }

        let left_is_leaf = index + 1 == a_segments.len();
        let right_is_leaf = index + 1 == b_segments.len();
        return match (left_is_leaf, right_is_leaf) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => left.as_os_str().cmp(right.as_os_str()),
        };
    }

    a_segments.len().cmp(&b_segments.len())
}

fn render(root: &Path, files: &[PathBuf]) -> String {
    files
        .iter()
        .filter_map(|file| file.strip_prefix(root).ok())
        .map(render_link)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_link(relative: &Path) -> String {
    let short = relative.to_string_lossy();
    let segments: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    let depth = segments.len().saturating_sub(1);
    let href = segments
        .iter()
        .map(|segment| utf8_percent_encode(segment, HREF_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    format!(
        "<a href=\"/{}\" class=\"depth--{}\">{}</a><br/>",
        escape_html(&href),
        depth,
        escape_html(&short)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<p>page</p>").unwrap();
    }

    #[test]
    fn test_compare_paths_is_segment_aware() {
        assert_eq!(
            compare_paths(Path::new("a/b"), Path::new("a-b/c")),
            Ordering::Less
        );
        assert_eq!(
            compare_paths(Path::new("a-b/c"), Path::new("a/b")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_paths_files_before_subdirectories() {
        assert_eq!(
            compare_paths(Path::new("z.html"), Path::new("a/index.html")),
            Ordering::Less
        );
        assert_eq!(
            compare_paths(Path::new("docs/z.html"), Path::new("docs/api/a.html")),
            Ordering::Less
        );
        assert_eq!(
            compare_paths(Path::new("docs/a.html"), Path::new("docs/a.html")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_listing_groups_by_directory() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b/z.html");
        touch(temp.path(), "a/y.html");
        touch(temp.path(), "a/x.html");
        touch(temp.path(), "index.html");

        let listing = build_listing(temp.path());
        let expected = [
            "<a href=\"/index.html\" class=\"depth--0\">index.html</a><br/>",
            "<a href=\"/a/x.html\" class=\"depth--1\">a/x.html</a><br/>",
            "<a href=\"/a/y.html\" class=\"depth--1\">a/y.html</a><br/>",
            "<a href=\"/b/z.html\" class=\"depth--1\">b/z.html</a><br/>",
        ]
        .join("\n");
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_listing_skips_non_html_and_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "style.css");
        touch(temp.path(), "nested/deep/page.html");
        fs::create_dir_all(temp.path().join("empty.html")).unwrap();

        let listing = build_listing(temp.path());
        assert_eq!(listing.matches("<a ").count(), 1);
        assert!(listing.contains("class=\"depth--2\""));
        assert!(listing.contains("href=\"/nested/deep/page.html\""));
    }

    #[test]
    fn test_listing_is_stable_across_calls() {
        let temp = TempDir::new().unwrap();
        for name in ["c.html", "a/b.html", "a-b/c.html", "b.html"] {
            touch(temp.path(), name);
        }

        let first = build_listing(temp.path());
        let second = build_listing(temp.path());
        assert_eq!(first, second);
        assert!(first.find("/a/b.html").unwrap() < first.find("/a-b/c.html").unwrap());
    }

    #[test]
    fn test_listing_escapes_markup() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a&b.html");

        let listing = build_listing(temp.path());
        assert!(listing.contains("href=\"/a&amp;b.html\""));
        assert!(listing.contains(">a&amp;b.html<"));
    }

    #[test]
    fn test_listing_encodes_hrefs() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "my page.html");
        touch(temp.path(), "a%20b.html");

        let listing = build_listing(temp.path());
        assert!(listing.contains("href=\"/my%20page.html\" class=\"depth--0\">my page.html<"));
        assert!(listing.contains("href=\"/a%2520b.html\" class=\"depth--0\">a%20b.html<"));
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_in_file_name_is_not_a_level() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "dir/back\\slash.html");

        let listing = build_listing(temp.path());
        assert!(listing.contains("href=\"/dir/back%5Cslash.html\" class=\"depth--1\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_listing_skips_links_leaving_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("site");
        touch(&root, "index.html");
        touch(temp.path(), "outside/secret.html");
        touch(temp.path(), "stray.html");
        std::os::unix::fs::symlink(temp.path().join("outside"), root.join("linked")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("stray.html"), root.join("stray.html"))
            .unwrap();
        std::os::unix::fs::symlink(root.join("index.html"), root.join("alias.html")).unwrap();

        let listing = build_listing(&root);
        assert!(listing.contains("href=\"/index.html\""));
        assert!(listing.contains("href=\"/alias.html\""));
        assert!(!listing.contains("secret.html"));
        assert!(!listing.contains("stray.html"));
    }

    #[test]
    fn test_listing_of_empty_root() {
        let temp = TempDir::new().unwrap();
        assert_eq!(build_listing(temp.path()), "");
    }
}
