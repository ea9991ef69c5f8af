//! Path splitting for opaque image paths.
//!
//! Image paths are plain strings that may come from any platform, so both `/`
//! and `\` count as separators regardless of the host OS.

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Directory prefix of `path`, including the trailing separator.
///
/// Returns the empty string when `path` has no separator.
pub fn dir_of(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// File name of `path`: everything after the last separator.
///
/// Returns `path` itself when there is no separator and the empty string when
/// `path` ends with one.
pub fn name_of(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_paths() {
        assert_eq!(dir_of("/home/user/pics/a.jpg"), "/home/user/pics/");
        assert_eq!(name_of("/home/user/pics/a.jpg"), "a.jpg");
    }

    #[test]
    fn test_windows_paths() {
        assert_eq!(dir_of(r"C:\Users\me\a.png"), r"C:\Users\me\");
        assert_eq!(name_of(r"C:\Users\me\a.png"), "a.png");
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(dir_of(r"C:\Users/me\sub/a.png"), r"C:\Users/me\sub/");
        assert_eq!(name_of(r"C:\Users/me\sub/a.png"), "a.png");
    }

    #[test]
    fn test_no_separator() {
        assert_eq!(dir_of("a.jpg"), "");
        assert_eq!(name_of("a.jpg"), "a.jpg");
        assert_eq!(dir_of(""), "");
        assert_eq!(name_of(""), "");
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(dir_of("/pics/"), "/pics/");
        assert_eq!(name_of("/pics/"), "");
        assert_eq!(name_of("/"), "");
        assert_eq!(dir_of("/"), "/");
    }

    #[test]
    fn test_multibyte_names() {
        assert_eq!(dir_of("/写真/猫.jpg"), "/写真/");
        assert_eq!(name_of("/写真/猫.jpg"), "猫.jpg");
    }

    #[test]
    fn test_dir_and_name_recombine() {
        for p in ["/a/b.jpg", r"x\y\z.png", "plain", "/", "trail/", ""] {
            assert_eq!(format!("{}{}", dir_of(p), name_of(p)), p);
        }
    }
}
