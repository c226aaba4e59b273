//! Database access layer
//!
//! One module per table group, sharing a single SQLite pool. All writes
//! that span multiple statements run inside explicit transactions.

mod activity;
mod allowlist;
mod init;
mod records;
mod refresh;
mod tabs;
mod views;

pub use activity::{
    add_comment, insert_discussion, insert_feedback, list_comments, list_discussions,
    list_feedback, list_recent_activity, list_record_activity, log_activity, ActivityEntry,
    Comment, DiscussionPost, FeedbackEntry,
};
pub use allowlist::{
    add_allowed_user, is_user_allowed, list_allowed_users, remove_allowed_user,
    sync_allowlist_from_config, AllowedUser,
};
pub use init::init_database;
#[doc(hidden)]
pub use init::init_memory_database;
pub use records::{
    count_records, count_updated_today, delete_record, get_record, insert_record, list_records,
    update_record, upsert_record, TrackedRecord, UpsertOutcome,
};
pub use refresh::{last_refresh, log_refresh, refresh_due, RefreshEntry};
pub use tabs::{list_tab, list_tab_ids, replace_tab};
pub use views::{
    delete_saved_view, delete_template, get_saved_view, get_template, list_saved_views,
    list_templates, save_saved_view, save_template, SavedView, Template,
};
