//! UI Components

pub mod dialogs;
pub mod status;
pub mod tag_editor;

pub use dialogs::{
    ConfirmCallback, ConfirmDialog, DialogState, Dialogs, FilterDialog, FilterPhase, GotoCallback,
    GotoDialog,
};
pub use status::StatusInfo;
pub use tag_editor::{join_tags, parse_tags, EditorAction, EditorMode, TagEditor};
