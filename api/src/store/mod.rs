mod post;
mod user;

pub use post::PostStore;
pub use user::UserStore;
