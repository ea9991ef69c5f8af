//! Operations the input layer can trigger

use std::fmt;
use std::str::FromStr;

/// Every user-triggerable operation.
///
/// Each operation has a stable string id used in configuration files
/// (`[keybindings.view]` / `[keybindings.edit]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Navigation
    Next,
    Prev,
    NextJump,
    PrevJump,
    Random,
    NextBookmark,
    PrevHistory,
    NextHistory,

    // Marking & files
    ToggleBookmark,
    DeleteWithConfirm,

    // Grid
    RowsIncrement,
    RowsDecrement,
    ColsIncrement,
    ColsDecrement,

    // Dialogs & overlays
    OpenTagEditor,
    ToggleInfoOverlay,
    OpenGoto,
    OpenFilter,

    // Rotation
    RotateGlobalRight,
    RotateGlobalLeft,
    RotateVisibleLocalRight,
    RotateVisibleLocalLeft,

    // Edit mode
    EnterEditMode,
    ExitEditMode,
    ResetVisibleTransform,
    ScaleVisibleUp,
    ScaleVisibleDown,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::Next,
        Operation::Prev,
        Operation::NextJump,
        Operation::PrevJump,
        Operation::Random,
        Operation::NextBookmark,
        Operation::PrevHistory,
        Operation::NextHistory,
        Operation::ToggleBookmark,
        Operation::DeleteWithConfirm,
        Operation::RowsIncrement,
        Operation::RowsDecrement,
        Operation::ColsIncrement,
        Operation::ColsDecrement,
        Operation::OpenTagEditor,
        Operation::ToggleInfoOverlay,
        Operation::OpenGoto,
        Operation::OpenFilter,
        Operation::RotateGlobalRight,
        Operation::RotateGlobalLeft,
        Operation::RotateVisibleLocalRight,
        Operation::RotateVisibleLocalLeft,
        Operation::EnterEditMode,
        Operation::ExitEditMode,
        Operation::ResetVisibleTransform,
        Operation::ScaleVisibleUp,
        Operation::ScaleVisibleDown,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Operation::Next => "nav.next",
            Operation::Prev => "nav.prev",
            Operation::NextJump => "nav.next_jump",
            Operation::PrevJump => "nav.prev_jump",
            Operation::Random => "nav.random",
            Operation::NextBookmark => "nav.next_bookmark",
            Operation::PrevHistory => "nav.prev_history",
            Operation::NextHistory => "nav.next_history",
            Operation::ToggleBookmark => "mark.toggle_bookmark",
            Operation::DeleteWithConfirm => "file.delete",
            Operation::RowsIncrement => "grid.rows_inc",
            Operation::RowsDecrement => "grid.rows_dec",
            Operation::ColsIncrement => "grid.cols_inc",
            Operation::ColsDecrement => "grid.cols_dec",
            Operation::OpenTagEditor => "tag.edit",
            Operation::ToggleInfoOverlay => "view.toggle_info",
            Operation::OpenGoto => "dialog.goto",
            Operation::OpenFilter => "dialog.filter",
            Operation::RotateGlobalRight => "view.rotate_global_right",
            Operation::RotateGlobalLeft => "view.rotate_global_left",
            Operation::RotateVisibleLocalRight => "view.rotate_local_right",
            Operation::RotateVisibleLocalLeft => "view.rotate_local_left",
            Operation::EnterEditMode => "edit.enter",
            Operation::ExitEditMode => "edit.exit",
            Operation::ResetVisibleTransform => "edit.reset",
            Operation::ScaleVisibleUp => "edit.scale_up",
            Operation::ScaleVisibleDown => "edit.scale_down",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Unknown operation id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.id() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_parse_back() {
        let ids: HashSet<_> = Operation::ALL.iter().map(|op| op.id()).collect();
        assert_eq!(ids.len(), Operation::ALL.len());
        for op in Operation::ALL {
            assert_eq!(op.id().parse::<Operation>(), Ok(*op));
        }
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(
            "nav.teleport".parse::<Operation>(),
            Err(UnknownOperation("nav.teleport".into()))
        );
    }
}
