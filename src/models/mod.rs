pub mod post;
pub mod row;
pub mod user;

pub use post::Post;
pub use row::{Row, RowValue};
pub use user::User;
