//! Home-page banner entity.

use serde::{Deserialize, Serialize};

use crate::types::BannerId;

/// A banner image with optional copy and link.
///
/// `order` is an explicit integer rank, rewritten for every item on each
/// reorder; legacy records may omit it (position in the stored list then
/// carries the ordering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_record_without_order() {
        let banner: Banner = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "image": "https://example.com/b1.jpg"
        }))
        .unwrap();
        assert_eq!(banner.order, 0);
        assert!(banner.title.is_none());
    }
}
