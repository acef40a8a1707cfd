use std::sync::Arc;

use crate::{
    api::{Comment, CommentId, Error, NewComment, PostId, RawComment},
    forest::Roots,
    node::insert_sorted,
    Forest, Normalizer, ThreadNode,
};

/// Result of `Forest::insert_reply`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Insertion {
    pub forest: Forest,

    /// false if the parent could not be found, in which case `forest` is
    /// the unchanged input
    pub inserted: bool,
}

impl Forest {
    /// Inserts one new comment without rebuilding the forest
    ///
    /// Only the nodes on the path from the parent up to its root are
    /// rebuilt, everything else is shared with `self`. The parent is looked
    /// for at most `max_depth` levels down. When it is not found, or when
    /// the comment is already in the post, nothing is inserted and the
    /// caller decides what to do.
    pub fn insert_reply(
        &self,
        post: PostId,
        parent: Option<CommentId>,
        comment: Comment,
    ) -> Insertion {
        if self.contains(post, comment.id) {
            tracing::debug!(comment = comment.id.0, post = post.0, "comment already in forest");
            return self.not_inserted();
        }
        let id = comment.id;
        let node = Arc::new(ThreadNode::leaf(comment, self.next_seq));
        let roots = self.posts.get(&post).cloned().unwrap_or_default();
        let roots = match parent {
            None => {
                let mut roots = roots;
                insert_sorted(&mut roots, node);
                Some(roots)
            }
            Some(parent) => insert_under(&roots, parent, &node, 0, self.max_depth),
        };
        match roots {
            Some(roots) => Insertion {
                forest: Forest {
                    posts: self.posts.update(post, roots),
                    next_seq: self.next_seq + 1,
                    max_depth: self.max_depth,
                },
                inserted: true,
            },
            None => {
                tracing::debug!(
                    comment = id.0,
                    post = post.0,
                    ?parent,
                    "parent not found, reply not inserted"
                );
                self.not_inserted()
            }
        }
    }

    /// Inserts a reply, putting it at the root of `post` if its parent is
    /// not in the forest
    pub fn apply_reply(&self, post: PostId, parent: Option<CommentId>, comment: Comment) -> Forest {
        if self.contains(post, comment.id) {
            return self.clone();
        }
        let res = self.insert_reply(post, parent, comment.clone());
        if res.inserted {
            return res.forest;
        }
        self.insert_reply(post, None, comment).forest
    }

    /// Integrates the backend's answer to a comment submission
    ///
    /// A rejected submission is handed back untouched, so that a reply never
    /// shows up before the backend has accepted it.
    pub fn accept_submission(
        &self,
        request: &NewComment,
        response: Result<RawComment, Error>,
    ) -> Result<Forest, Error> {
        let raw = response.map_err(|err| {
            tracing::info!(post = request.post.0, "comment submission rejected: {err}");
            err
        })?;
        let mut normalizer = Normalizer::default();
        normalizer.reserve(self.ids());
        let comment = normalizer.normalize(&raw);
        Ok(self.apply_reply(request.post, request.parent, comment))
    }

    fn not_inserted(&self) -> Insertion {
        Insertion {
            forest: self.clone(),
            inserted: false,
        }
    }
}

/// Copy of `nodes` with `node` added under `parent`, or None if `parent`
/// is not within reach
fn insert_under(
    nodes: &Roots,
    parent: CommentId,
    node: &Arc<ThreadNode>,
    level: usize,
    max_depth: usize,
) -> Option<Roots> {
    // The new node would sit at level + 1
    if level >= max_depth {
        return None;
    }
    for (idx, n) in nodes.iter().enumerate() {
        let children = if n.id() == parent {
            let mut children = n.children.clone();
            insert_sorted(&mut children, node.clone());
            children
        } else {
            match insert_under(&n.children, parent, node, level + 1, max_depth) {
                Some(children) => children,
                None => continue,
            }
        };
        let mut res = nodes.clone();
        res.set(
            idx,
            Arc::new(ThreadNode {
                comment: n.comment.clone(),
                seq: n.seq,
                children,
            }),
        );
        return Some(res);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::tests::comment, TreeConfig};
    use serde_json::json;

    fn ids(nodes: &Roots) -> Vec<i64> {
        nodes.iter().map(|n| n.id().0).collect()
    }

    fn sample() -> Forest {
        Forest::build(&[
            RawComment(json!({ "id": 1, "post": 1, "created_at": 1000 })),
            RawComment(json!({ "id": 2, "post": 1, "parent": 1, "created_at": 2000 })),
            RawComment(json!({ "id": 3, "post": 1, "created_at": 3000 })),
        ])
    }

    #[test]
    fn reply_to_nested_parent() {
        let f = sample();
        let res = f.insert_reply(PostId(1), Some(CommentId(2)), comment(4, Some(2), 4));
        assert!(res.inserted);
        let roots = res.forest.roots(PostId(1));
        assert_eq!(ids(&roots), vec![1, 3]);
        assert_eq!(ids(&roots[0].children[0].children), vec![4]);
        assert_eq!(res.forest.count(PostId(1)), 4);

        // The old snapshot is untouched
        assert_eq!(f.count(PostId(1)), 3);
    }

    #[test]
    fn missing_parent_is_reported() {
        let f = sample()
            .insert_reply(PostId(1), Some(CommentId(2)), comment(4, Some(2), 4))
            .forest;
        let res = f.insert_reply(PostId(1), Some(CommentId(999)), comment(5, Some(999), 5));
        assert!(!res.inserted);
        assert_eq!(res.forest, f);
        assert_eq!(res.forest.count(PostId(1)), 4);

        // Parents of other posts do not count
        let res = f.insert_reply(PostId(2), Some(CommentId(1)), comment(6, Some(1), 6));
        assert!(!res.inserted);
    }

    #[test]
    fn root_insertion_keeps_order() {
        let f = sample();
        let res = f.insert_reply(PostId(1), None, comment(7, None, 2));
        assert!(res.inserted);
        assert_eq!(ids(&res.forest.roots(PostId(1))), vec![1, 7, 3]);

        let res = f.insert_reply(PostId(9), None, comment(8, None, 0));
        assert!(res.inserted);
        assert_eq!(ids(&res.forest.roots(PostId(9))), vec![8]);
        assert_eq!(res.forest.count(PostId(1)), 3);
    }

    #[test]
    fn siblings_are_shared() {
        let f = sample();
        let before = f.roots(PostId(1));
        let after = f
            .insert_reply(PostId(1), Some(CommentId(2)), comment(4, Some(2), 4))
            .forest
            .roots(PostId(1));
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert!(!Arc::ptr_eq(&before[0].children[0], &after[0].children[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
    }

    #[test]
    fn replies_order_by_time_not_arrival() {
        let f = sample();
        let late_first = f
            .insert_reply(PostId(1), Some(CommentId(1)), comment(11, Some(1), 9))
            .forest
            .insert_reply(PostId(1), Some(CommentId(1)), comment(10, Some(1), 5))
            .forest;
        let early_first = f
            .insert_reply(PostId(1), Some(CommentId(1)), comment(10, Some(1), 5))
            .forest
            .insert_reply(PostId(1), Some(CommentId(1)), comment(11, Some(1), 9))
            .forest;
        let order = |f: &Forest| ids(&f.roots(PostId(1))[0].children);
        assert_eq!(order(&late_first), vec![2, 10, 11]);
        assert_eq!(order(&early_first), vec![2, 10, 11]);
    }

    #[test]
    fn duplicates_are_not_inserted() {
        let f = sample();
        let res = f.insert_reply(PostId(1), Some(CommentId(3)), comment(2, Some(3), 2));
        assert!(!res.inserted);
        assert_eq!(f.apply_reply(PostId(1), None, comment(2, None, 2)), f);
    }

    #[test]
    fn search_depth_is_bounded() {
        let cfg = TreeConfig {
            max_depth: 2,
            ..TreeConfig::default()
        };
        let f = Forest::build_with(
            &cfg,
            &[
                RawComment(json!({ "id": 1, "post": 1 })),
                RawComment(json!({ "id": 2, "post": 1, "parent": 1 })),
                RawComment(json!({ "id": 3, "post": 1, "parent": 2 })),
            ],
        );
        assert!(
            f.insert_reply(PostId(1), Some(CommentId(2)), comment(4, Some(2), 4))
                .inserted
        );
        assert!(
            !f.insert_reply(PostId(1), Some(CommentId(3)), comment(5, Some(3), 5))
                .inserted
        );
    }

    #[test]
    fn apply_falls_back_to_root() {
        let f = sample().apply_reply(
            PostId(1),
            Some(CommentId(999)),
            comment(5, Some(999), 5000),
        );
        assert_eq!(ids(&f.roots(PostId(1))), vec![1, 3, 5]);

        let f = sample().apply_reply(
            PostId(1),
            Some(CommentId(3)),
            comment(6, Some(3), 6),
        );
        assert_eq!(ids(&f.roots(PostId(1))[1].children), vec![6]);
    }

    #[test]
    fn submissions() {
        let f = sample();
        let req = NewComment::reply(PostId(1), CommentId(3), String::from("agreed"));
        let echo = RawComment(json!({
            "id": 20,
            "body": "agreed",
            "parent": 3,
            "post": 1,
            "created_at": "2024-01-01T00:00:00Z"
        }));
        let updated = f.accept_submission(&req, Ok(echo)).unwrap();
        assert_eq!(updated.count(PostId(1)), 4);
        let node = updated.find(PostId(1), CommentId(20)).unwrap();
        assert_eq!(node.comment.body, "agreed");
        assert_eq!(ids(&updated.roots(PostId(1))[1].children), vec![20]);

        let rejected = f.accept_submission(&req, Err(Error::PermissionDenied));
        assert_eq!(rejected, Err(Error::PermissionDenied));
        assert_eq!(f.count(PostId(1)), 3);
    }

    #[test]
    fn echo_without_id_is_kept() {
        let f = Forest::build(&[
            RawComment(json!({ "post": 1, "body": "first" })),
            RawComment(json!({ "post": 1, "body": "second" })),
        ]);
        let req = NewComment::root(PostId(1), String::from("third"));
        let echo = RawComment(json!({ "post": 1, "body": "third" }));
        let updated = f.accept_submission(&req, Ok(echo.clone())).unwrap();
        assert_eq!(updated.count(PostId(1)), 3);
        let again = updated.accept_submission(&req, Ok(echo)).unwrap();
        assert_eq!(again.count(PostId(1)), 4);
        let bodies = again
            .flatten(PostId(1))
            .into_iter()
            .filter(|c| c.body == "third")
            .count();
        assert_eq!(bodies, 2);
    }
}
