//! The user roster: filter rules, the base listing query, the form and the
//! operations the HTTP layer calls.

pub mod filter;
pub mod forms;
pub mod operations;
pub mod password;
pub mod query;

pub use filter::{ROLES, SORTABLE_COLUMNS, STATES, USER_FILTERS};
pub use forms::{FormMode, UserForm, ValidatedUser};
pub use operations::{
    ListOptions, ProfileDetails, SortableColumn, UserDetails, UserListing, UserSummary,
};
pub use password::{hash_password, verify_password};
pub use query::{TeamPresence, TrashScope, UserRow};
