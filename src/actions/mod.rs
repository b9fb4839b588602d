//! Terminal actions on REMOVE-marked paths.
//!
//! The delete module provides two sinks:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion
//!
//! ```no_run
//! use dupfinder::actions::trash_files;
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/path/to/duplicate.txt")];
//! let summary = trash_files(&paths)?;
//! println!("{}", summary.summary());
//! # Ok::<(), dupfinder::actions::DeleteError>(())
//! ```

pub mod delete;

pub use delete::{
    delete_to_trash, permanent_delete, remove_files, trash_files, DeleteError, SinkKind,
    SinkSummary,
};
