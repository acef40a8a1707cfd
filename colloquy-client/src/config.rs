use anyhow::Context;

use crate::api::Author;

pub const DEFAULT_MAX_DEPTH: usize = 500;
pub const MAX_DEPTH_VAR: &str = "COLLOQUY_MAX_DEPTH";

/// Values substituted for author fields the backend did not provide
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AuthorDefaults {
    pub name: String,
    pub avatar_url: String,
    pub reputation: i64,
    pub badge: String,
}

impl Default for AuthorDefaults {
    fn default() -> AuthorDefaults {
        AuthorDefaults {
            name: String::from("Anonymous"),
            avatar_url: String::from("/placeholder.svg?height=40&width=40"),
            reputation: 0,
            badge: String::from("Member"),
        }
    }
}

impl AuthorDefaults {
    pub fn author(&self) -> Author {
        Author {
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            reputation: self.reputation,
            badge: self.badge.clone(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Bound on parent-chain walks, both when building and when searching
    /// for a reply's parent
    pub max_depth: usize,

    pub author_defaults: AuthorDefaults,
}

impl Default for TreeConfig {
    fn default() -> TreeConfig {
        TreeConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            author_defaults: AuthorDefaults::default(),
        }
    }
}

impl TreeConfig {
    pub fn from_json(body: &[u8]) -> anyhow::Result<TreeConfig> {
        serde_json::from_slice(body).context("parsing tree configuration")
    }

    /// Default configuration, with the depth bound overridden by
    /// `COLLOQUY_MAX_DEPTH` when it is set
    pub fn from_env() -> anyhow::Result<TreeConfig> {
        let mut res = TreeConfig::default();
        if let Ok(depth) = std::env::var(MAX_DEPTH_VAR) {
            res.max_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("parsing {MAX_DEPTH_VAR}={depth:?} as a depth"))?;
        }
        Ok(res)
    }
}
