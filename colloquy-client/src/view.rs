use std::sync::Arc;

use crate::{
    api::{Comment, CommentId, PostId},
    flatten, Forest, ThreadNode,
};

/// Pre-order listing of `nodes` with each comment's nesting depth, for
/// indented rendering
pub fn walk<'a, I>(nodes: I) -> Vec<(usize, &'a Comment)>
where
    I: IntoIterator<Item = &'a Arc<ThreadNode>>,
{
    let mut res = Vec::new();
    walk_into(nodes, 0, &mut res);
    res
}

fn walk_into<'a, I>(nodes: I, depth: usize, res: &mut Vec<(usize, &'a Comment)>)
where
    I: IntoIterator<Item = &'a Arc<ThreadNode>>,
{
    for n in nodes {
        res.push((depth, &n.comment));
        walk_into(&n.children, depth + 1, res);
    }
}

/// A discussion as shown in the thread dialog: the comment that was opened,
/// followed by every reply below it
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ThreadSummary {
    pub original: Comment,
    pub replies: Vec<Comment>,
}

impl ThreadSummary {
    pub fn from_node(node: &ThreadNode) -> ThreadSummary {
        ThreadSummary {
            original: node.comment.clone(),
            replies: flatten(&node.children),
        }
    }
}

impl Forest {
    pub fn summary(&self, post: PostId, id: CommentId) -> Option<ThreadSummary> {
        self.find(post, id).map(|n| ThreadSummary::from_node(&n))
    }
}
