pub mod auth;
pub mod health;
pub mod posts;
pub mod prompt;
pub mod register;

pub use auth::AuthenticatedUser;
pub use health::health_check;
pub use posts::{create_post, delete_post, get_post, list_posts};
pub use prompt::process_prompt;
pub use register::register_user;
