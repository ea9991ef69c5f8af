//! Status snapshot for hosts

/// Everything a host needs to describe the current view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInfo {
    /// Full path of the current image
    pub path: Option<String>,

    /// Current file name
    pub file_name: String,

    /// 1-based position in the filtered list, 0 when empty
    pub position: usize,

    /// Images in the filtered list
    pub count: usize,

    /// Images regardless of the filter
    pub total: usize,

    pub filtered: bool,
    pub bookmarked: bool,
    pub bookmarks: usize,

    pub rows: usize,
    pub cols: usize,

    pub edit_mode: bool,
    /// Help line while edit mode is active
    pub hint: Option<String>,
    pub info_overlay: bool,

    /// Global plus local rotation of the current image, in degrees
    pub rotation: u32,
    pub scale_percent: u32,

    /// Toast text while visible
    pub message: Option<String>,
}

impl StatusInfo {
    /// One-line summary, used as the window title
    pub fn title(&self) -> String {
        if self.count == 0 {
            let mut title = String::from("Flipview");
            if self.filtered {
                title.push_str(&format!(" - no match ({} hidden)", self.total));
            }
            if let Some(message) = &self.message {
                title.push_str(&format!(" - {}", message));
            }
            return title;
        }

        let name = if self.info_overlay {
            self.path.as_deref().unwrap_or(&self.file_name)
        } else {
            &self.file_name
        };

        let mut parts = vec![format!("[{}/{}] {}", self.position, self.count, name)];

        if self.filtered {
            parts.push(format!("filter {}/{}", self.count, self.total));
        }
        if self.bookmarked {
            parts.push("*".to_string());
        }
        if self.bookmarks > 0 && self.info_overlay {
            parts.push(format!("{} bookmarked", self.bookmarks));
        }
        if self.rows * self.cols > 1 {
            parts.push(format!("{}x{}", self.rows, self.cols));
        }
        if self.rotation != 0 {
            parts.push(format!("{}°", self.rotation));
        }
        if self.scale_percent != 100 {
            parts.push(format!("{}%", self.scale_percent));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("[{}]", hint));
        } else if self.edit_mode {
            parts.push("[edit]".to_string());
        }

        let mut title = parts.join(" ");
        if let Some(message) = &self.message {
            title.push_str(&format!(" - {}", message));
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_title() {
        assert_eq!(StatusInfo::default().title(), "Flipview");
    }

    #[test]
    fn test_title_parts() {
        let info = StatusInfo {
            path: Some("/p/a.png".to_string()),
            file_name: "a.png".to_string(),
            position: 2,
            count: 5,
            total: 9,
            filtered: true,
            bookmarked: true,
            rows: 2,
            cols: 1,
            rotation: 90,
            scale_percent: 100,
            message: Some("Bookmarked (1)".to_string()),
            ..StatusInfo::default()
        };
        assert_eq!(
            info.title(),
            "[2/5] a.png filter 5/9 * 2x1 90° - Bookmarked (1)"
        );
    }

    #[test]
    fn test_title_shows_edit_hint() {
        let info = StatusInfo {
            file_name: "a.png".to_string(),
            position: 1,
            count: 1,
            scale_percent: 100,
            edit_mode: true,
            hint: Some("Edit mode: Esc to exit".to_string()),
            ..StatusInfo::default()
        };
        assert_eq!(info.title(), "[1/1] a.png [Edit mode: Esc to exit]");
    }
}
