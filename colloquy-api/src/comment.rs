use crate::Time;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub i64);

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub i64);

impl PostId {
    /// Bucket for comments whose owning post could not be resolved
    pub fn unassigned() -> PostId {
        PostId(i64::MIN)
    }

    pub fn is_unassigned(&self) -> bool {
        *self == PostId::unassigned()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub name: String,
    pub avatar_url: String,
    pub reputation: i64,
    pub badge: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub body: String,
    pub author: Author,
    pub created_at: Time,
    pub updated_at: Option<Time>,

    /// None for comments attached directly to the post
    pub parent_id: Option<CommentId>,

    /// Only meaningful for root comments
    pub post_id: Option<PostId>,
}

/// Payload submitted to the backend to create a comment
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentId>,
    pub post: PostId,
}

impl NewComment {
    pub fn root(post: PostId, body: String) -> NewComment {
        NewComment {
            body,
            parent: None,
            post,
        }
    }

    pub fn reply(post: PostId, parent: CommentId, body: String) -> NewComment {
        NewComment {
            body,
            parent: Some(parent),
            post,
        }
    }
}
