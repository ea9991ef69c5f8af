//! Flipview Core Domain Logic
//!
//! This crate contains:
//! - The image collection (cursor, filter, bookmarks, history, transforms)
//! - Directory-keyed tag cache
//! - Grid layout, edit mode and toast state
//! - Operations the input layer dispatches
//! - Configuration
//! - Error types

pub mod collection;
pub mod command;
pub mod config;
pub mod edit_mode;
pub mod error;
pub mod history;
pub mod image_entry;
pub mod layout;
pub mod observe;
pub mod tag_cache;
pub mod toast;

pub use app_fs::{dir_of, name_of};
pub use collection::Collection;
pub use command::{Operation, UnknownOperation};
pub use config::{
    AppConfig, FilesConfig, GridConfig, KeybindingsConfig, NavigationConfig, TagConfig,
    ToastConfig, TransformConfig,
};
pub use edit_mode::{EditMode, EDIT_MODE_HINT};
pub use error::{AppError, Result, TagRejection};
pub use history::History;
pub use image_entry::{ImageEntry, Rotation};
pub use layout::GridLayout;
pub use observe::{Observers, SubscriptionId};
pub use tag_cache::{validate_tags, TagCache, TagLimits};
pub use toast::Toast;
