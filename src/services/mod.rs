//! API services consumed by the export pipeline.

pub mod conversations;
pub mod files;
pub mod users;

pub use conversations::ConversationsService;
pub use files::FileFetcher;
pub use users::UsersService;
