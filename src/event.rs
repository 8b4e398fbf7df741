//! Input model for decoded post records
//!
//! One `PostEvent` per firehose post, validated once at the ingestion
//! boundary. Every upstream field that can be missing is `#[serde(default)]`
//! so a malformed record deserializes with defaults instead of being
//! rejected outright.

use serde::{Deserialize, Serialize};

/// A single decoded post notification plus its originating author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEvent {
    /// Stable author identifier (DID), taken from the operation path
    pub author: String,
    /// Creation timestamp as delivered upstream (ISO-8601, not reparsed)
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub reply: Option<ReplyRef>,
}

/// Embedded media descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "$type", default)]
    pub kind: String,
    #[serde(default)]
    pub images: Vec<ImageItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub mime: String,
}

/// Rich-text annotation; only link features are of interest here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facet {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "$type", default)]
    pub kind: String,
    #[serde(default)]
    pub uri: String,
}

/// Parent/root pointers of a reply post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyRef {
    #[serde(default)]
    pub parent: PostRef,
    #[serde(default)]
    pub root: PostRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRef {
    #[serde(default)]
    pub uri: String,
}

pub const EMBED_IMAGES_TYPE: &str = "app.bsky.embed.images";
pub const FACET_LINK_TYPE: &str = "app.bsky.richtext.facet#link";

impl PostEvent {
    /// True if the embed carries images.
    pub fn has_images(&self) -> bool {
        self.embed
            .as_ref()
            .map(|e| e.kind == EMBED_IMAGES_TYPE)
            .unwrap_or(false)
    }

    /// Images attached to this post, empty unless the embed is an image embed.
    pub fn images(&self) -> &[ImageItem] {
        match &self.embed {
            Some(e) if e.kind == EMBED_IMAGES_TYPE => &e.images,
            _ => &[],
        }
    }

    /// Link features across all facets, in order.
    pub fn link_features(&self) -> impl Iterator<Item = &Feature> {
        self.facets
            .iter()
            .flat_map(|f| f.features.iter())
            .filter(|f| f.kind == FACET_LINK_TYPE)
    }

    pub fn link_count(&self) -> usize {
        self.link_features().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_deserializes_with_defaults() {
        let json = r#"{"author":"did:plc:abc","text":"hi"}"#;
        let event: PostEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.author, "did:plc:abc");
        assert_eq!(event.created_at, "");
        assert!(event.embed.is_none());
        assert!(event.facets.is_empty());
        assert!(event.reply.is_none());
    }

    #[test]
    fn test_wire_field_names() {
        let json = r#"{
            "author": "did:plc:abc",
            "createdAt": "2024-01-01T00:00:00Z",
            "text": "look",
            "embed": {"$type": "app.bsky.embed.images", "images": [{"alt": "a cat", "mime": "image/jpeg"}]},
            "facets": [{"features": [{"$type": "app.bsky.richtext.facet#link", "uri": "https://example.com/x"}]}]
        }"#;
        let event: PostEvent = serde_json::from_str(json).unwrap();
        assert!(event.has_images());
        assert_eq!(event.images().len(), 1);
        assert_eq!(event.link_count(), 1);
        assert_eq!(event.created_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_non_image_embed_yields_no_images() {
        let json = r#"{
            "author": "did:plc:abc",
            "text": "quote",
            "embed": {"$type": "app.bsky.embed.record", "images": []}
        }"#;
        let event: PostEvent = serde_json::from_str(json).unwrap();
        assert!(!event.has_images());
        assert!(event.images().is_empty());
    }
}
