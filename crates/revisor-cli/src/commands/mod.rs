//! Command implementations.

pub mod add;
pub mod history;
pub mod list;
pub mod review;

pub use self::add::execute_add;
pub use self::history::execute_history;
pub use self::list::execute_list;
pub use self::review::execute_review;
