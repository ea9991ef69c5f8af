//! Tag editor overlay for one image

use crate::input::{NamedKey, RawInput};

/// Split a comma separated tag field, trimming parts and dropping empty ones
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_tags`] for tags without commas or surrounding whitespace
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Palette of available tags
    #[default]
    Chip,
    /// Free text field
    Text,
}

/// What the host should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Save(Vec<String>),
    Cancel,
}

/// Modal editor of the tags of one image
#[derive(Debug, Default)]
pub struct TagEditor {
    open: bool,
    /// Waiting for the image's tags; already counts as open
    loading: bool,
    generation: u64,
    path: String,
    tags: Vec<String>,
    available: Vec<String>,
    text: String,
    mode: EditorMode,
    /// Swallows the key that opened the editor until its release is seen
    ignore_until_keyup: bool,
}

impl TagEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open over `path` in loading state. Returns the generation to finish with.
    pub fn begin_open(&mut self, path: impl Into<String>) -> u64 {
        self.generation += 1;
        self.open = true;
        self.loading = true;
        self.path = path.into();
        self.tags.clear();
        self.available.clear();
        self.text.clear();
        self.mode = EditorMode::Chip;
        self.ignore_until_keyup = true;
        self.generation
    }

    /// Deliver the loaded tags. Ignored if the editor was closed or reopened meanwhile.
    pub fn finish_open(&mut self, generation: u64, tags: Vec<String>, available: Vec<String>) -> bool {
        if !self.open || !self.loading || self.generation != generation {
            return false;
        }
        self.loading = false;
        self.text = join_tags(&tags);
        self.tags = tags;
        self.available = available;
        self.available.sort();
        self.available.dedup();
        true
    }

    pub fn close(&mut self) {
        if self.open {
            self.generation += 1;
        }
        self.open = false;
        self.loading = false;
    }

    /// Close only if nothing reopened the editor since `generation`
    pub fn close_if(&mut self, generation: u64) -> bool {
        if self.open && self.generation == generation {
            self.close();
            true
        } else {
            false
        }
    }

    pub fn key_down(&mut self, input: &RawInput) -> EditorAction {
        if !self.open || self.loading || self.ignore_until_keyup {
            return EditorAction::None;
        }

        match (self.mode, input) {
            (_, RawInput::Named(NamedKey::Escape)) => EditorAction::Cancel,
            (EditorMode::Chip, RawInput::Named(NamedKey::Tab)) => {
                self.focus_text();
                EditorAction::None
            }
            (EditorMode::Chip, RawInput::Named(NamedKey::Enter)) => {
                EditorAction::Save(self.tags.clone())
            }
            (EditorMode::Chip, RawInput::Char(c)) => {
                if let Some(first) = c.chars().next().filter(|ch| ch.is_alphanumeric()) {
                    self.add_first_matching(first);
                }
                EditorAction::None
            }
            (EditorMode::Text, RawInput::Named(NamedKey::Enter)) => {
                EditorAction::Save(parse_tags(&self.text))
            }
            _ => EditorAction::None,
        }
    }

    pub fn key_up(&mut self) {
        self.ignore_until_keyup = false;
    }

    /// Add the first available tag starting with `c` that is not included yet
    fn add_first_matching(&mut self, c: char) -> Option<&str> {
        let wanted: String = c.to_lowercase().collect();
        let tag = self
            .available
            .iter()
            .filter(|t| !self.tags.contains(t))
            .find(|t| {
                t.chars()
                    .next()
                    .is_some_and(|first| first.to_lowercase().collect::<String>() == wanted)
            })?
            .clone();
        self.tags.push(tag);
        self.text = join_tags(&self.tags);
        self.tags.last().map(String::as_str)
    }

    /// Include or exclude `tag`. Returns whether it is now included.
    pub fn toggle_chip(&mut self, tag: &str) -> bool {
        let included = if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
            false
        } else {
            self.tags.push(tag.to_string());
            true
        };
        self.text = join_tags(&self.tags);
        included
    }

    /// Switch to free text mode
    pub fn focus_text(&mut self) {
        if self.mode == EditorMode::Chip {
            self.text = join_tags(&self.tags);
        }
        self.mode = EditorMode::Text;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.mode = EditorMode::Text;
    }

    /// Tags a save would write right now
    pub fn pending_tags(&self) -> Vec<String> {
        match self.mode {
            EditorMode::Chip => self.tags.clone(),
            EditorMode::Text => parse_tags(&self.text),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn opened(tags: &[&str], available: &[&str]) -> TagEditor {
        let mut editor = TagEditor::new();
        let generation = editor.begin_open("/p/a.png");
        assert!(editor.finish_open(generation, strings(tags), strings(available)));
        editor.key_up();
        editor
    }

    #[test]
    fn test_parse_and_join() {
        assert_eq!(parse_tags(" a , b,,c ,"), strings(&["a", "b", "c"]));
        assert!(parse_tags("  ").is_empty());

        let tags = strings(&["sky", "blue sea", "夜"]);
        assert_eq!(parse_tags(&join_tags(&tags)), tags);
    }

    #[test]
    fn test_opening_key_is_swallowed() {
        let mut editor = TagEditor::new();
        let generation = editor.begin_open("/p/a.png");
        assert!(editor.is_open());
        assert!(editor.is_loading());
        assert!(editor.finish_open(generation, vec![], strings(&["travel"])));

        assert_eq!(editor.key_down(&RawInput::char("t")), EditorAction::None);
        assert!(editor.tags().is_empty());

        editor.key_up();
        editor.key_down(&RawInput::char("t"));
        assert_eq!(editor.tags(), strings(&["travel"]));
    }

    #[test]
    fn test_chip_key_picks_first_unused_match() {
        let mut editor = opened(&["sea"], &["Sky", "sea", "sand", "tree"]);
        editor.key_down(&RawInput::char("s"));
        assert_eq!(editor.tags(), strings(&["sea", "Sky"]));
        editor.key_down(&RawInput::char("S"));
        assert_eq!(editor.tags(), strings(&["sea", "Sky", "sand"]));

        // Nothing left starting with s
        editor.key_down(&RawInput::char("s"));
        assert_eq!(editor.tags().len(), 3);
        editor.key_down(&RawInput::char("-"));
        assert_eq!(editor.tags().len(), 3);
    }

    #[test]
    fn test_text_mode_save_and_cancel() {
        let mut editor = opened(&["a", "b"], &[]);
        editor.key_down(&RawInput::Named(NamedKey::Tab));
        assert_eq!(editor.mode(), EditorMode::Text);
        assert_eq!(editor.text(), "a, b");

        editor.set_text("a, c ,, d");
        // Character keys belong to the text field now
        assert_eq!(editor.key_down(&RawInput::char("x")), EditorAction::None);
        assert_eq!(
            editor.key_down(&RawInput::Named(NamedKey::Enter)),
            EditorAction::Save(strings(&["a", "c", "d"]))
        );
        assert_eq!(
            editor.key_down(&RawInput::Named(NamedKey::Escape)),
            EditorAction::Cancel
        );
    }

    #[test]
    fn test_toggle_chip() {
        let mut editor = opened(&["a"], &["a", "b"]);
        assert!(editor.toggle_chip("b"));
        assert!(!editor.toggle_chip("a"));
        assert_eq!(editor.pending_tags(), strings(&["b"]));
    }

    #[test]
    fn test_stale_finish_is_ignored() {
        let mut editor = TagEditor::new();
        let first = editor.begin_open("/p/a.png");
        editor.close();
        assert!(!editor.finish_open(first, strings(&["x"]), vec![]));
        assert!(!editor.is_open());

        let second = editor.begin_open("/p/b.png");
        assert!(!editor.close_if(first));
        assert!(editor.close_if(second));
    }
}
