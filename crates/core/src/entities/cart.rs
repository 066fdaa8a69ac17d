//! Cart lines.
//!
//! A cart line is a product+variant combination, not a product: the same
//! product in two colors is two distinct lines. Display fields (`name`,
//! `price`, `image`) are denormalized snapshots taken when the line is
//! added; they are not re-synced if the product changes later.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, LineId, ProductId};

/// Minimum quantity per line.
pub const MIN_QTY: u32 = 1;
/// Maximum quantity per line.
pub const MAX_QTY: u32 = 99;

/// Clamp a quantity into the valid `[1, 99]` range.
#[must_use]
pub const fn clamp_qty(qty: u32) -> u32 {
    if qty < MIN_QTY {
        MIN_QTY
    } else if qty > MAX_QTY {
        MAX_QTY
    } else {
        qty
    }
}

impl LineId {
    /// Variant color marker inside a composed line id.
    pub const COLOR_MARKER: &'static str = "-c:";
    /// Variant size marker inside a composed line id.
    pub const SIZE_MARKER: &'static str = "-s:";

    /// Compose a line id from a product id and its selected options:
    /// `productId[-c:color][-s:size]`.
    #[must_use]
    pub fn compose(product: &ProductId, color: Option<&str>, size: Option<&str>) -> Self {
        let mut id = product.as_str().to_owned();
        if let Some(color) = color {
            id.push_str(Self::COLOR_MARKER);
            id.push_str(color);
        }
        if let Some(size) = size {
            id.push_str(Self::SIZE_MARKER);
            id.push_str(size);
        }
        Self::new(id)
    }

    /// Split a composed line id back into `(product_id, color, size)`.
    ///
    /// Markers resolve from the right, so a color whose text contains
    /// `-s:` still parses when a size follows it. An option value that
    /// itself ends the id with a marker substring is inherently ambiguous
    /// in this format and splits at its last occurrence.
    #[must_use]
    pub fn split(&self) -> (ProductId, Option<String>, Option<String>) {
        let mut rest = self.as_str();
        let size = rest.rfind(Self::SIZE_MARKER).map(|at| {
            let size = rest[at + Self::SIZE_MARKER.len()..].to_owned();
            rest = &rest[..at];
            size
        });
        let color = rest.rfind(Self::COLOR_MARKER).map(|at| {
            let color = rest[at + Self::COLOR_MARKER.len()..].to_owned();
            rest = &rest[..at];
            color
        });
        (ProductId::from(rest), color, size)
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Composite line identity, see [`LineId::compose`].
    pub id: LineId,
    pub name: String,
    pub price: Amount,
    pub image: String,
    pub qty: u32,
    /// Weak back-reference to the product; not an ownership relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl CartLine {
    /// Price times quantity for this line.
    #[must_use]
    pub const fn line_total(&self) -> Amount {
        self.price.times(self.qty)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_qty_bounds() {
        assert_eq!(clamp_qty(0), 1);
        assert_eq!(clamp_qty(1), 1);
        assert_eq!(clamp_qty(50), 50);
        assert_eq!(clamp_qty(99), 99);
        assert_eq!(clamp_qty(100), 99);
    }

    #[test]
    fn test_line_id_compose_and_split() {
        let pid = ProductId::from("p1");
        let id = LineId::compose(&pid, Some("red"), Some("XL"));
        assert_eq!(id.as_str(), "p1-c:red-s:XL");
        assert_eq!(id.split(), (pid.clone(), Some("red".into()), Some("XL".into())));

        let bare = LineId::compose(&pid, None, None);
        assert_eq!(bare.as_str(), "p1");
        assert_eq!(bare.split(), (pid.clone(), None, None));

        let size_only = LineId::compose(&pid, None, Some("M"));
        assert_eq!(size_only.as_str(), "p1-s:M");
        assert_eq!(size_only.split(), (pid, None, Some("M".into())));
    }

    #[test]
    fn test_line_id_split_handles_marker_in_color() {
        let pid = ProductId::from("p1");
        let id = LineId::compose(&pid, Some("x-s:y"), Some("M"));
        assert_eq!(id.as_str(), "p1-c:x-s:y-s:M");
        assert_eq!(id.split(), (pid, Some("x-s:y".into()), Some("M".into())));
    }

    #[test]
    fn test_wire_shape_matches_legacy() {
        let line = CartLine {
            id: LineId::from("p1-c:red"),
            name: "Shirt".into(),
            price: Amount::new(1000),
            image: "img".into(),
            qty: 2,
            product_id: Some(ProductId::from("p1")),
            color: Some("red".into()),
            size: None,
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["id"], "p1-c:red");
        assert_eq!(json["productId"], "p1");
        assert!(json.get("size").is_none());
    }
}
