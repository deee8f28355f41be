//! Users service.

mod requests;
mod responses;
mod service;

pub use requests::ListUsersRequest;
pub use responses::ListUsersResponse;
pub use service::UsersService;
