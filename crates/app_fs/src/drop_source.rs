//! Turning dropped paths into image paths

use std::fs;
use std::path::Path;

/// Extensions recognised as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];

/// Check whether `path` names an image by its extension
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Expand dropped paths into image paths.
///
/// Image paths are kept as given. Directories are scanned one level deep and
/// their image files appended in name order. Everything else is skipped.
pub fn extract_image_paths<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut images = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if is_image_path(Path::new(path)) {
            images.push(path.to_string());
            continue;
        }

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping dropped path {}: {}", path, e);
                continue;
            }
        };

        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_image_path(p))
            .filter_map(|p| match p.to_str() {
                Some(s) => Some(s.to_string()),
                None => {
                    tracing::warn!("Skipping non UTF-8 path: {:?}", p);
                    None
                }
            })
            .collect();
        found.sort();

        tracing::debug!("Found {} images in dropped folder {}", found.len(), path);
        images.extend(found);
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a.jpg")));
        assert!(is_image_path(Path::new("a.PNG")));
        assert!(is_image_path(Path::new("/x/y.WebP")));
        assert!(!is_image_path(Path::new("a.txt")));
        assert!(!is_image_path(Path::new("jpg")));
    }

    #[test]
    fn test_files_kept_directories_expanded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.jpg"), b"").unwrap();

        let dir_str = dir.path().to_str().unwrap().to_string();
        let result = extract_image_paths(vec![
            "/elsewhere/dropped.gif".to_string(),
            dir_str.clone(),
            "/does/not/exist".to_string(),
        ]);

        assert_eq!(
            result,
            vec![
                "/elsewhere/dropped.gif".to_string(),
                dir.path().join("a.jpg").to_str().unwrap().to_string(),
                dir.path().join("b.png").to_str().unwrap().to_string(),
            ]
        );
    }
}
