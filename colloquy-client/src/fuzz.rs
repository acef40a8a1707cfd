#![cfg(test)]

use std::{collections::HashSet, sync::Arc};

use serde_json::json;

use crate::{
    api::{CommentId, PostId, RawComment},
    forest::Roots,
    node::tests::comment,
    Forest,
};

/// (id, parent, creation time, post), kept in small ranges so that
/// duplicates, orphans, cycles and timestamp ties all show up
type Batch = Vec<(u8, Option<u8>, u8, u8)>;

fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }
}

fn raw_batch(batch: &Batch) -> Vec<RawComment> {
    batch
        .iter()
        .map(|(id, parent, t, post)| {
            RawComment(json!({
                "id": id % 32,
                "parent": parent.map(|p| p % 32),
                "created_at": u64::from(*t % 8) * 1000,
                "post": post % 3,
            }))
        })
        .collect()
}

fn assert_sorted(nodes: &Roots) {
    let times = nodes
        .iter()
        .map(|n| n.comment.created_at)
        .collect::<Vec<_>>();
    assert!(times.windows(2).all(|w| w[0] <= w[1]), "unsorted: {times:?}");
    for n in nodes.iter() {
        assert_sorted(&n.children);
    }
}

fn assert_well_formed(f: &Forest) {
    for (_, roots) in f.iter() {
        assert_sorted(roots);
    }
    let flat = f.flatten_all();
    assert_eq!(flat.len(), f.len());
    let ids = flat.iter().map(|c| c.id).collect::<HashSet<_>>();
    assert_eq!(ids.len(), flat.len(), "comment appears twice");
}

#[test]
fn build_is_complete_sorted_and_idempotent() {
    init_tracing();
    bolero::check!()
        .with_type::<Batch>()
        .for_each(|batch: &Batch| {
            let raws = raw_batch(batch);
            let f = Forest::build(&raws);
            let distinct = batch
                .iter()
                .map(|(id, ..)| id % 32)
                .collect::<HashSet<_>>();
            assert_eq!(f.len(), distinct.len());
            assert_well_formed(&f);
            assert_eq!(f, Forest::build(&raws));
        })
}

#[test]
fn insertion_is_local() {
    init_tracing();
    bolero::check!()
        .with_type::<(Batch, Option<u8>, u8, u8)>()
        .for_each(|(batch, parent, t, post)| {
            let f = Forest::build(&raw_batch(batch));
            let post = PostId(i64::from(post % 3));
            let parent = parent.map(|p| CommentId(i64::from(p % 32)));
            let new = comment(100, parent.map(|p| p.0), i64::from(*t % 8));
            let res = f.insert_reply(post, parent, new);

            if !res.inserted {
                assert_eq!(res.forest, f);
                assert!(parent.is_some());
                assert!(!f.contains(post, CommentId(100)));
                return;
            }
            assert_eq!(res.forest.len(), f.len() + 1);
            assert!(res.forest.contains(post, CommentId(100)));
            assert_well_formed(&res.forest);

            // Other posts are shared as a whole
            for (p, roots) in f.iter().filter(|(p, _)| *p != post) {
                let after = res.forest.roots(p);
                assert!(roots.iter().zip(after.iter()).all(|(a, b)| Arc::ptr_eq(a, b)));
            }

            // At most one root of the post was rebuilt
            let before = f.roots(post);
            let after = res.forest.roots(post);
            let rebuilt = after
                .iter()
                .filter(|a| !before.iter().any(|b| Arc::ptr_eq(a, b)))
                .count();
            assert_eq!(rebuilt, 1);
        })
}

#[test]
fn apply_never_loses_replies() {
    init_tracing();
    bolero::check!()
        .with_type::<(Batch, Option<u8>)>()
        .for_each(|(batch, parent)| {
            let f = Forest::build(&raw_batch(batch));
            let parent = parent.map(|p| CommentId(i64::from(p)));
            let updated = f.apply_reply(PostId(0), parent, comment(100, parent.map(|p| p.0), 3));
            assert_eq!(updated.len(), f.len() + 1);
            assert_well_formed(&updated);
        })
}

#[test]
fn two_cycle() {
    let f = Forest::build(&[
        RawComment(json!({ "id": 1, "parent": 2, "post": 1 })),
        RawComment(json!({ "id": 2, "parent": 1, "post": 1 })),
    ]);
    let roots = f.roots(PostId(1));
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|r| r.children.is_empty()));
}
