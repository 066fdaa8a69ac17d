//! Product entity.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, ProductId};

/// A storefront product.
///
/// `compare_at_price`, when present, is informational only; it is not
/// enforced to exceed `price` - display components decide what to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_price: Option<Amount>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Free-text category name; empty means uncategorized.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Free-text badge tag (e.g. "new", "sale").
    #[serde(default)]
    pub badge: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

/// Payload for creating a product; the repository mints the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_price: Option<Amount>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl NewProduct {
    /// Attach an id, producing a full [`Product`].
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            compare_at_price: self.compare_at_price,
            coupon_price: self.coupon_price,
            image: self.image,
            images: self.images,
            category: self.category,
            description: self.description,
            badge: self.badge,
            colors: self.colors,
            sizes: self.sizes,
        }
    }
}

/// Partial update for a product; `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Amount>,
    pub compare_at_price: Option<Option<Amount>>,
    pub coupon_price: Option<Option<Amount>>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub badge: Option<String>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
}

impl ProductPatch {
    /// Apply this patch to a product in place.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(compare_at_price) = self.compare_at_price {
            product.compare_at_price = compare_at_price;
        }
        if let Some(coupon_price) = self.coupon_price {
            product.coupon_price = coupon_price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(badge) = self.badge {
            product.badge = badge;
        }
        if let Some(colors) = self.colors {
            product.colors = colors;
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
    }
}
