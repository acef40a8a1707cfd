use anyhow::{anyhow, Context};
use serde_json::Value;

/// A comment record exactly as the backend sent it
///
/// Field names and shapes vary between endpoints, so nothing is assumed
/// about its contents until it goes through the normalizer.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RawComment(pub Value);

impl From<Value> for RawComment {
    fn from(v: Value) -> RawComment {
        RawComment(v)
    }
}

impl RawComment {
    /// Returns the first of `names` that is present and not null
    pub fn field(&self, names: &[&str]) -> Option<&Value> {
        let obj = self.0.as_object()?;
        names
            .iter()
            .filter_map(|n| obj.get(*n))
            .find(|v| !v.is_null())
    }

    /// Removes and returns the nested replies sent by the thread endpoint
    pub fn take_replies(&mut self) -> Vec<RawComment> {
        let replies = match &mut self.0 {
            Value::Object(obj) => obj.remove("replies"),
            _ => None,
        };
        match replies {
            Some(Value::Array(replies)) => replies.into_iter().map(RawComment).collect(),
            _ => Vec::new(),
        }
    }

    /// Sets `name` unless one of `aliases` already holds a non-null value
    pub fn set_default(&mut self, name: &str, aliases: &[&str], value: Value) {
        if self.field(aliases).is_some() {
            return;
        }
        if let Value::Object(obj) = &mut self.0 {
            obj.insert(String::from(name), value);
        }
    }

    /// Parses a list response, either a bare array or a paginated
    /// `{ "results": [...] }` object
    pub fn parse_batch(body: &[u8]) -> anyhow::Result<Vec<RawComment>> {
        let data: Value = serde_json::from_slice(body).context("parsing comment batch")?;
        let items = match data {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("results") {
                Some(Value::Array(items)) => items,
                _ => return Err(anyhow!("comment batch object has no results array")),
            },
            _ => return Err(anyhow!("comment batch is neither an array nor an object")),
        };
        Ok(items.into_iter().map(RawComment).collect())
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<RawComment> {
        let data: Value = serde_json::from_slice(body).context("parsing comment")?;
        if !data.is_object() {
            return Err(anyhow!("comment is not a json object"));
        }
        Ok(RawComment(data))
    }
}

/// A root comment with its replies nested under `replies`, as returned when
/// a single discussion is opened
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RawThread(pub RawComment);

impl RawThread {
    pub fn parse(body: &[u8]) -> anyhow::Result<RawThread> {
        RawComment::parse(body)
            .context("parsing comment thread")
            .map(RawThread)
    }

    pub fn root(&self) -> &RawComment {
        &self.0
    }
}
