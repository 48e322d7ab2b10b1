use serde::{Deserialize, Serialize};

/// Public site origin used to build canonical permalinks.
pub const SITE_URL: &str = "https://reddit.com";

/// OAuth token grant (client-credentials flow).
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Wrapper Reddit puts around every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A listing child. `data` stays untyped so one malformed record cannot fail
/// the whole page; callers decode it into [`Submission`] or [`Comment`].
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: serde_json::Value,
}

/// Fullname prefix for comments (`t1_…`).
pub const COMMENT_KIND: &str = "t1";
/// Fullname prefix for submissions (`t3_…`).
pub const SUBMISSION_KIND: &str = "t3";

/// A submission (`t3`) as returned inside a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// A comment (`t1`) as returned inside a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub permalink: Option<String>,
    /// Fullname of what this replies to: `t1_…` for a comment, `t3_…` for the post.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Title of the submission the comment lives under.
    #[serde(default)]
    pub link_title: Option<String>,
}

impl Comment {
    /// True when the comment replies to another comment rather than to the post.
    pub fn replies_to_comment(&self) -> bool {
        self.parent_id
            .as_deref()
            .is_some_and(|id| id.starts_with(&format!("{COMMENT_KIND}_")))
    }
}

/// Turn a relative permalink into the canonical absolute URL.
pub fn permalink_url(permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        permalink.to_string()
    } else {
        format!("{SITE_URL}{permalink}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_keeps_children_untyped() {
        let json = r#"{"kind":"Listing","data":{"after":"t3_abc","children":[
            {"kind":"t3","data":{"title":"Hello","score":"not-a-number"}}
        ]}}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_abc"));
        assert_eq!(listing.data.children.len(), 1);
        assert!(serde_json::from_value::<Submission>(listing.data.children[0].data.clone()).is_err());
    }

    #[test]
    fn comment_parent_kind() {
        let reply = Comment {
            parent_id: Some("t1_xyz".into()),
            ..Default::default()
        };
        let top_level = Comment {
            parent_id: Some("t3_xyz".into()),
            ..Default::default()
        };
        assert!(reply.replies_to_comment());
        assert!(!top_level.replies_to_comment());
        assert!(!Comment::default().replies_to_comment());
    }

    #[test]
    fn permalink_is_made_absolute() {
        assert_eq!(
            permalink_url("/r/rust/comments/abc/title/"),
            "https://reddit.com/r/rust/comments/abc/title/"
        );
        assert_eq!(
            permalink_url("https://reddit.com/r/rust/"),
            "https://reddit.com/r/rust/"
        );
    }
}
