//! Prelude module - commonly used test utilities.
//!
//! Use `use aussie_test::prelude::*;` to import all essential types.

pub use crate::{
    EventRecorder, RecordingExecutor, SlowExecutor, TestCore, init_test_logging, test_dir,
    test_file_store, test_task, test_window_registry,
};
