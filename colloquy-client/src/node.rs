use std::{cmp::Ordering, sync::Arc};

use crate::api::{Comment, CommentId, Time};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadNode {
    pub comment: Comment,

    /// Arrival order, breaks ties between equal creation times
    pub(crate) seq: u64,

    /// Replies in chronological order
    pub children: im::Vector<Arc<ThreadNode>>,
}

impl ThreadNode {
    pub(crate) fn leaf(comment: Comment, seq: u64) -> ThreadNode {
        ThreadNode {
            comment,
            seq,
            children: im::Vector::new(),
        }
    }

    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    pub(crate) fn sort_key(&self) -> (Time, u64) {
        (self.comment.created_at, self.seq)
    }

    /// Number of replies at any depth below this node
    pub fn reply_count(&self) -> usize {
        count_nested(&self.children)
    }

    /// Finds a comment anywhere below `nodes`, looking at most `max_depth`
    /// levels down
    pub fn find_in<'a>(
        nodes: &'a im::Vector<Arc<ThreadNode>>,
        id: CommentId,
        max_depth: usize,
    ) -> Option<&'a Arc<ThreadNode>> {
        for n in nodes.iter() {
            if n.id() == id {
                return Some(n);
            }
            if max_depth > 0 {
                if let Some(res) = ThreadNode::find_in(&n.children, id, max_depth - 1) {
                    return Some(res);
                }
            }
        }
        None
    }
}

/// Inserts `node` at its chronological position, after any node with the
/// same key
pub(crate) fn insert_sorted(nodes: &mut im::Vector<Arc<ThreadNode>>, node: Arc<ThreadNode>) {
    let key = node.sort_key();
    let (Ok(idx) | Err(idx)) =
        nodes.binary_search_by(|n| n.sort_key().cmp(&key).then(Ordering::Less));
    nodes.insert(idx, node);
}

/// Total number of comments reachable from `nodes`
pub fn count_nested<'a, I>(nodes: I) -> usize
where
    I: IntoIterator<Item = &'a Arc<ThreadNode>>,
{
    nodes
        .into_iter()
        .map(|n| 1 + count_nested(&n.children))
        .sum()
}

/// Pre-order listing of every comment reachable from `nodes`
pub fn flatten<'a, I>(nodes: I) -> Vec<Comment>
where
    I: IntoIterator<Item = &'a Arc<ThreadNode>>,
{
    let mut res = Vec::new();
    flatten_into(nodes, &mut res);
    res
}

fn flatten_into<'a, I>(nodes: I, res: &mut Vec<Comment>)
where
    I: IntoIterator<Item = &'a Arc<ThreadNode>>,
{
    for n in nodes {
        res.push(n.comment.clone());
        flatten_into(&n.children, res);
    }
}
