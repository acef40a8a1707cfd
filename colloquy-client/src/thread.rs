use crate::{
    api::{RawComment, RawThread},
    normalize::{ID_FIELDS, PARENT_FIELDS, POST_FIELDS},
    Forest, TreeConfig,
};

impl Forest {
    /// Builds the forest of a single discussion, as returned by the thread
    /// endpoint
    pub fn from_thread(thread: &RawThread) -> Forest {
        Forest::from_thread_with(&TreeConfig::default(), thread)
    }

    pub fn from_thread_with(config: &TreeConfig, thread: &RawThread) -> Forest {
        Forest::build_with(config, &flatten_thread(thread))
    }
}

/// Turns the nested `replies` of a thread into a flat batch, in pre-order
///
/// Replies that do not name their parent or post inherit them from the
/// comment they are nested in.
pub fn flatten_thread(thread: &RawThread) -> Vec<RawComment> {
    let mut res = Vec::new();
    let mut stack = vec![thread.root().clone()];
    while let Some(mut raw) = stack.pop() {
        let id = raw.field(ID_FIELDS).cloned();
        let post = raw.field(POST_FIELDS).cloned();
        for mut reply in raw.take_replies().into_iter().rev() {
            if let Some(id) = &id {
                reply.set_default("parent", PARENT_FIELDS, id.clone());
            }
            if let Some(post) = &post {
                reply.set_default("post", POST_FIELDS, post.clone());
            }
            stack.push(reply);
        }
        res.push(raw);
    }
    res
}
