use std::{
    collections::HashSet,
    sync::atomic::{AtomicI64, Ordering},
};

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::{
    api::{Author, Comment, CommentId, PostId, RawComment, Time},
    AuthorDefaults,
};

pub(crate) const ID_FIELDS: &[&str] = &["id", "pk"];
pub(crate) const PARENT_FIELDS: &[&str] = &["parent", "parent_id", "parentId"];
pub(crate) const POST_FIELDS: &[&str] = &["post", "post_id", "postId"];

/// Maps the many shapes of backend comment records onto `Comment`
///
/// Never fails: anything that cannot be understood degrades to a default.
/// Records without any usable id get a negative local id, handed out from
/// this normalizer's own counter so that normalizing the same batch twice
/// yields the same ids. Local ids skip everything passed to `reserve`.
#[derive(Clone, Debug)]
pub struct Normalizer {
    defaults: AuthorDefaults,
    next_local_id: i64,
    taken: HashSet<CommentId>,
}

impl Default for Normalizer {
    fn default() -> Normalizer {
        Normalizer::new(AuthorDefaults::default())
    }
}

impl Normalizer {
    pub fn new(defaults: AuthorDefaults) -> Normalizer {
        Normalizer {
            defaults,
            next_local_id: -1,
            taken: HashSet::new(),
        }
    }

    /// Marks `ids` as used by real comments, so that no local id equals one
    pub fn reserve<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = CommentId>,
    {
        self.taken.extend(ids);
    }

    /// Reserves the ids every record of `raws` carries
    pub fn reserve_batch(&mut self, raws: &[RawComment]) {
        self.reserve(
            raws.iter()
                .filter_map(|r| r.field(ID_FIELDS).and_then(as_i64))
                .map(CommentId),
        );
    }

    pub fn normalize(&mut self, raw: &RawComment) -> Comment {
        let id = match raw.field(ID_FIELDS).and_then(as_i64) {
            Some(id) => CommentId(id),
            None => self.local_id(),
        };
        self.normalize_with_id(raw, id)
    }

    fn local_id(&mut self) -> CommentId {
        while self.taken.contains(&CommentId(self.next_local_id)) {
            self.next_local_id -= 1;
        }
        let id = CommentId(self.next_local_id);
        self.next_local_id -= 1;
        id
    }

    fn normalize_with_id(&self, raw: &RawComment, id: CommentId) -> Comment {
        Comment {
            id,
            body: raw
                .field(&["body", "content"])
                .map(as_text)
                .unwrap_or_default(),
            author: self.author(raw.field(&["author", "user"])),
            created_at: raw
                .field(&["created_at", "createdAt"])
                .and_then(as_time)
                .unwrap_or(Time::UNIX_EPOCH),
            updated_at: raw.field(&["updated_at", "updatedAt"]).and_then(as_time),
            parent_id: raw.field(PARENT_FIELDS).and_then(reference).map(CommentId),
            post_id: raw.field(POST_FIELDS).and_then(post_reference).map(PostId),
        }
    }

    fn author(&self, author: Option<&Value>) -> Author {
        let mut res = self.defaults.author();
        match author {
            Some(Value::Object(obj)) => {
                let get = |names: &[&str]| first_of(obj, names);
                if let Some(name) = get(&["name", "username"]).map(as_text) {
                    res.name = name;
                }
                if let Some(avatar) = get(&["avatar", "profile_image"]).map(as_text) {
                    res.avatar_url = avatar;
                }
                if let Some(rep) = get(&["reputation", "score"]).and_then(as_i64) {
                    res.reputation = rep;
                }
                if let Some(badge) = get(&["badge", "role"]).map(as_text) {
                    res.badge = badge;
                }
            }
            // Some endpoints only send the username
            Some(Value::String(name)) if !name.trim().is_empty() => res.name = name.clone(),
            _ => (),
        }
        res
    }
}

static NEXT_LOCAL_ID: AtomicI64 = AtomicI64::new(-1);

/// Normalizes a single record outside of any forest
///
/// Local ids come from a process-wide counter. Records meant for an existing
/// forest should go through a `Normalizer` that reserved the forest's ids.
pub fn normalize(raw: &RawComment) -> Comment {
    let normalizer = Normalizer::default();
    match raw.field(ID_FIELDS).and_then(as_i64) {
        Some(id) => normalizer.normalize_with_id(raw, CommentId(id)),
        None => {
            let id = NEXT_LOCAL_ID.fetch_sub(1, Ordering::Relaxed);
            normalizer.normalize_with_id(raw, CommentId(id))
        }
    }
}

/// Integers, integral floats and numeric strings
pub(crate) fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn first_of<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| obj.get(*n))
        .find(|v| !v.is_null())
}

/// A bare id, or an object exposing `id`/`pk`
fn reference(v: &Value) -> Option<i64> {
    match v {
        Value::Object(obj) => first_of(obj, ID_FIELDS).and_then(as_i64),
        v => as_i64(v),
    }
}

fn post_reference(v: &Value) -> Option<i64> {
    match v {
        Value::Object(obj) => first_of(obj, &["id", "pk", "post_id", "slug"]).and_then(as_i64),
        v => as_i64(v),
    }
}

fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        v => v.to_string(),
    }
}

/// RFC 3339, naive date-times read as UTC, bare dates, or epoch milliseconds
pub(crate) fn as_time(v: &Value) -> Option<Time> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Utc.from_utc_datetime(&t));
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| Utc.from_utc_datetime(&t))
        }
        _ => None,
    }
}
