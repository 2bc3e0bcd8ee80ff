//! # Cart Blob Codec
//!
//! The cart is persisted as a single text value: a JSON array of line-items.
//!
//! ```json
//! [
//!   {"id":"A","title":"Coffee","image_url":"https://img/a.png","price":10.0,"quantity":2},
//!   {"id":"B","title":"Tea","image_url":"https://img/b.png","price":4.5,"quantity":1}
//! ]
//! ```
//!
//! Decoding does not enforce the cart invariants; pass the result through
//! [`crate::Cart::from_items`] to repair duplicates and empty entries.

use crate::error::CoreResult;
use crate::types::LineItem;

/// Serializes line-items into the persisted blob.
pub fn encode(items: &[LineItem]) -> CoreResult<String> {
    Ok(serde_json::to_string(items)?)
}

/// Parses the persisted blob back into line-items.
pub fn decode(blob: &str) -> CoreResult<Vec<LineItem>> {
    Ok(serde_json::from_str(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::NewLineItem;
    use proptest::prelude::*;

    #[test]
    fn test_decode_reference_blob() {
        let blob = r#"[{"id":"B","title":"Tea","image_url":"https://img/b.png","price":4.5,"quantity":2}]"#;

        let items = decode(blob).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "B");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, 4.5);
    }

    #[test]
    fn test_decode_accepts_integer_price() {
        let blob = r#"[{"id":"A","title":"t","image_url":"u","price":10,"quantity":1}]"#;
        assert_eq!(decode(blob).unwrap()[0].price, 10.0);
    }

    #[test]
    fn test_decode_rejects_malformed_blob() {
        for blob in [
            "",
            "{not json",
            r#"{"id":"A"}"#,
            r#"[{"id":"A","title":"t","image_url":"u","price":1,"quantity":-1}]"#,
            r#"[{"id":"A","title":"t","price":1,"quantity":1}]"#,
        ] {
            assert!(
                matches!(decode(blob), Err(CoreError::Codec(_))),
                "blob should be rejected: {blob:?}"
            );
        }
    }

    #[test]
    fn test_empty_cart_encodes_as_empty_array() {
        assert_eq!(encode(&[]).unwrap(), "[]");
    }

    fn item_strategy() -> impl Strategy<Value = LineItem> {
        (
            "[a-z0-9-]{1,12}",
            any::<String>(),
            "https://[a-z]{1,8}\\.test/[a-z0-9]{0,8}",
            -1.0e9f64..1.0e9f64,
            1u32..=u32::MAX,
        )
            .prop_map(|(id, title, image_url, price, quantity)| {
                LineItem::from_new(NewLineItem::new(id, title, image_url, price), quantity)
            })
    }

    proptest! {
        #[test]
        fn round_trip_preserves_cart(items in prop::collection::vec(item_strategy(), 0..16)) {
            let blob = encode(&items).unwrap();
            let decoded = decode(&blob).unwrap();

            prop_assert_eq!(decoded, items);
        }
    }
}
