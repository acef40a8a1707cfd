use chrono::Utc;

pub type Time = chrono::DateTime<Utc>;

mod comment;
pub use comment::{Author, Comment, CommentId, NewComment, PostId};

mod error;
pub use error::Error;

mod raw;
pub use raw::{RawComment, RawThread};
