use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::{
    api::{Comment, CommentId, PostId, RawComment, Time},
    count_nested, flatten, walk, Normalizer, ThreadNode, TreeConfig,
};

pub type Roots = im::Vector<Arc<ThreadNode>>;

/// Discussion trees of several posts
///
/// Cloning is cheap and every update returns a new forest sharing all
/// untouched nodes with the old one, so older snapshots stay valid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Forest {
    pub(crate) posts: im::OrdMap<PostId, Roots>,

    /// Sequence number given to the next inserted comment
    pub(crate) next_seq: u64,

    pub(crate) max_depth: usize,
}

impl Default for Forest {
    fn default() -> Forest {
        Forest::with_config(&TreeConfig::default())
    }
}

impl Forest {
    pub fn with_config(config: &TreeConfig) -> Forest {
        Forest {
            posts: im::OrdMap::new(),
            next_seq: 0,
            max_depth: config.max_depth,
        }
    }

    pub fn build(raws: &[RawComment]) -> Forest {
        Forest::build_with(&TreeConfig::default(), raws)
    }

    /// Builds the discussion trees of a whole batch of raw comments
    ///
    /// Every distinct comment ends up exactly once in the result: replies
    /// whose parent is missing, is themselves, lies on a parent cycle, or
    /// would sit deeper than `config.max_depth` become roots of their post.
    pub fn build_with(config: &TreeConfig, raws: &[RawComment]) -> Forest {
        let mut normalizer = Normalizer::new(config.author_defaults.clone());
        normalizer.reserve_batch(raws);
        let mut comments = Vec::with_capacity(raws.len());
        let mut index = HashMap::with_capacity(raws.len());
        for raw in raws {
            let c = normalizer.normalize(raw);
            if index.contains_key(&c.id) {
                tracing::warn!(comment = c.id.0, "discarding duplicate comment");
                continue;
            }
            index.insert(c.id, comments.len());
            comments.push(c);
        }

        let parents = comments
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let parent = c
                    .parent_id
                    .and_then(|p| index.get(&p).copied())
                    .filter(|p| *p != i);
                if c.parent_id.is_some() && parent.is_none() {
                    tracing::debug!(
                        comment = c.id.0,
                        parent = ?c.parent_id,
                        "parent not in batch, placing comment at root"
                    );
                }
                parent
            })
            .collect::<Vec<_>>();
        let (parents, depths) = place(parents, config.max_depth);

        let mut children = vec![Vec::new(); comments.len()];
        let mut roots = BTreeMap::<PostId, Vec<usize>>::new();
        for (i, p) in parents.iter().enumerate() {
            match p {
                Some(p) => children[*p].push(i),
                None => roots
                    .entry(comments[i].post_id.unwrap_or_else(PostId::unassigned))
                    .or_default()
                    .push(i),
            }
        }

        // Build deepest nodes first, so that children always exist before
        // their parent needs them
        let keys = comments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.created_at, i as u64))
            .collect::<Vec<(Time, u64)>>();
        let mut order = (0..comments.len()).collect::<Vec<_>>();
        order.sort_by_key(|i| std::cmp::Reverse(depths[*i]));
        let mut comments = comments.into_iter().map(Some).collect::<Vec<_>>();
        let mut built: Vec<Option<Arc<ThreadNode>>> = vec![None; comments.len()];
        for i in order {
            let kids = take_sorted(&mut children[i], &keys, &mut built);
            if let Some(comment) = comments[i].take() {
                built[i] = Some(Arc::new(ThreadNode {
                    comment,
                    seq: keys[i].1,
                    children: kids,
                }));
            }
        }

        let posts = roots
            .into_iter()
            .map(|(post, mut ids)| (post, take_sorted(&mut ids, &keys, &mut built)))
            .collect();
        Forest {
            posts,
            next_seq: keys.len() as u64,
            max_depth: config.max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Root comments of `post`, oldest first
    pub fn roots(&self, post: PostId) -> Roots {
        self.posts.get(&post).cloned().unwrap_or_default()
    }

    /// Posts having at least one comment
    pub fn posts(&self) -> impl Iterator<Item = PostId> + '_ {
        self.posts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PostId, &Roots)> + '_ {
        self.posts.iter().map(|(p, r)| (*p, r))
    }

    pub fn find(&self, post: PostId, id: CommentId) -> Option<Arc<ThreadNode>> {
        let roots = self.posts.get(&post)?;
        ThreadNode::find_in(roots, id, self.max_depth).cloned()
    }

    pub fn contains(&self, post: PostId, id: CommentId) -> bool {
        self.find(post, id).is_some()
    }

    /// Number of comments under `post`, replies included
    pub fn count(&self, post: PostId) -> usize {
        self.posts.get(&post).map(count_nested).unwrap_or(0)
    }

    /// Number of comments over all posts
    pub fn len(&self) -> usize {
        self.posts.values().map(count_nested).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.values().all(|r| r.is_empty())
    }

    /// Per-post comment counts, for reply badges
    pub fn reply_counts(&self) -> BTreeMap<PostId, usize> {
        self.posts
            .iter()
            .map(|(p, r)| (*p, count_nested(r)))
            .collect()
    }

    pub fn flatten(&self, post: PostId) -> Vec<Comment> {
        self.posts.get(&post).map(flatten).unwrap_or_default()
    }

    /// Ids of every comment, over all posts
    pub fn ids(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.posts
            .values()
            .flat_map(walk)
            .map(|(_, c)| c.id)
    }

    /// Every comment, post by post, each post in pre-order
    pub fn flatten_all(&self) -> Vec<Comment> {
        self.posts.values().flat_map(flatten).collect()
    }
}

fn take_sorted(
    ids: &mut [usize],
    keys: &[(Time, u64)],
    built: &mut [Option<Arc<ThreadNode>>],
) -> Roots {
    ids.sort_by_key(|i| keys[*i]);
    ids.iter().filter_map(|i| built[*i].take()).collect()
}

/// Decides where every comment goes, given the parent each one asks for
///
/// Returns the parent actually used and the resulting depth (0 for roots).
/// Comments on a parent cycle, and comments that would end up deeper than
/// `max_depth`, are turned into roots.
fn place(mut parents: Vec<Option<usize>>, max_depth: usize) -> (Vec<Option<usize>>, Vec<usize>) {
    let mut depths: Vec<Option<usize>> = vec![None; parents.len()];
    let mut on_path = vec![false; parents.len()];
    for start in 0..parents.len() {
        if depths[start].is_some() {
            continue;
        }

        // Walk up until reaching a root or an already-placed comment
        let mut path = Vec::new();
        let mut cur = Some(start);
        while let Some(c) = cur {
            if depths[c].is_some() {
                break;
            }
            if on_path[c] {
                if let Some(pos) = path.iter().position(|p| *p == c) {
                    for member in path.drain(pos..) {
                        tracing::warn!(
                            comment_idx = member,
                            "parent cycle, placing comment at root"
                        );
                        parents[member] = None;
                        depths[member] = Some(0);
                    }
                }
                break;
            }
            on_path[c] = true;
            path.push(c);
            cur = parents[c];
        }

        for &c in path.iter().rev() {
            let mut depth = parents[c]
                .and_then(|p| depths[p])
                .map_or(0, |d| d + 1);
            if depth > max_depth {
                tracing::warn!(
                    comment_idx = c,
                    max_depth,
                    "reply nested too deep, placing comment at root"
                );
                parents[c] = None;
                depth = 0;
            }
            depths[c] = Some(depth);
        }
    }
    let depths = depths.into_iter().map(|d| d.unwrap_or(0)).collect();
    (parents, depths)
}
