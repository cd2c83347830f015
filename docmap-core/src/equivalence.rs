//! Dirty checking across cast boundaries.
//!
//! Plain equality is not enough to tell whether an attribute changed: a handle rebuilt
//! from its string is a new value with the same bytes, and two date representations can
//! denote the same instant. [`is_unchanged`] applies the comparison tiers in order and
//! the first one that decides wins.

use bson::{Bson, Document};

use crate::{date::format_date, schema::ModelSchema, value::{Value, numeric_string}};

/// Decides whether `key` in `attributes` still matches its value in `original`.
///
/// 1. Never persisted under `key`: changed.
/// 2. Equal stored values: unchanged.
/// 3. Current value null or absent: changed.
/// 4. Date attribute: unchanged iff both format to the same date string.
/// 5. Cast attribute: unchanged iff both cast to the same stored form.
/// 6. Otherwise unchanged iff both are numeric-like with identical string forms.
pub fn is_unchanged(attributes: &Document, original: &Document, schema: &ModelSchema, key: &str) -> bool {
    let Some(original) = original.get(key) else {
        return false;
    };
    let current = attributes.get(key).unwrap_or(&Bson::Null);

    if current == original {
        return true;
    }

    if *current == Bson::Null {
        return false;
    }

    if schema.is_date(key) {
        let format = &schema.date_format;

        return match (format_date(current, format), format_date(original, format)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        };
    }

    if let Some(caster) = schema.caster(key) {
        return match (caster.write(Value::from(current)), caster.write(Value::from(original))) {
            (Ok(left), Ok(right)) => left == right,
            _ => false,
        };
    }

    match (numeric_string(current), numeric_string(original)) {
        (Some(left), Some(right)) => left.as_bytes() == right.as_bytes(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::CasterKind;
    use bson::{DateTime as BsonDateTime, doc, oid::ObjectId};

    fn schema() -> ModelSchema {
        ModelSchema::new("posts")
            .cast("author_id", CasterKind::ObjectId)
            .date("published_at")
    }

    fn check(current: Document, original: Document, key: &str) -> bool {
        is_unchanged(&current, &original, &schema(), key)
    }

    #[test]
    fn missing_from_snapshot_is_changed() {
        assert!(!check(doc! { "title": "a" }, doc! {}, "title"));
        assert!(!check(doc! {}, doc! {}, "title"));
    }

    #[test]
    fn identical_values_are_unchanged() {
        assert!(check(doc! { "title": "a" }, doc! { "title": "a" }, "title"));
        assert!(check(doc! { "title": null }, doc! { "title": null }, "title"));
        assert!(check(doc! {}, doc! { "title": null }, "title"));
    }

    #[test]
    fn null_current_is_changed() {
        assert!(!check(doc! { "title": null }, doc! { "title": "a" }, "title"));
        assert!(!check(doc! {}, doc! { "title": "a" }, "title"));
    }

    #[test]
    fn dates_compare_by_formatted_string() {
        let native = BsonDateTime::from_millis(1_577_836_800_000);

        assert!(check(
            doc! { "published_at": "2020-01-01 00:00:00" },
            doc! { "published_at": native },
            "published_at",
        ));
        // Sub-second differences vanish under the canonical format.
        assert!(check(
            doc! { "published_at": BsonDateTime::from_millis(1_577_836_800_400) },
            doc! { "published_at": native },
            "published_at",
        ));
        assert!(!check(
            doc! { "published_at": "2020-01-02" },
            doc! { "published_at": native },
            "published_at",
        ));
        assert!(!check(
            doc! { "published_at": "whenever" },
            doc! { "published_at": native },
            "published_at",
        ));
    }

    #[test]
    fn cast_attributes_compare_in_stored_form() {
        let oid = ObjectId::new();

        assert!(check(
            doc! { "author_id": oid.to_hex() },
            doc! { "author_id": oid },
            "author_id",
        ));
        assert!(!check(
            doc! { "author_id": ObjectId::new() },
            doc! { "author_id": oid },
            "author_id",
        ));
        assert!(!check(
            doc! { "author_id": "garbage" },
            doc! { "author_id": oid },
            "author_id",
        ));
    }

    #[test]
    fn numeric_values_compare_by_string_form() {
        assert!(check(doc! { "n": 1_i64 }, doc! { "n": 1_i32 }, "n"));
        assert!(check(doc! { "n": "5" }, doc! { "n": 5 }, "n"));
        assert!(check(doc! { "n": 2.0 }, doc! { "n": 2 }, "n"));
        assert!(!check(doc! { "n": "5.0" }, doc! { "n": 5 }, "n"));
        assert!(!check(doc! { "n": true }, doc! { "n": 1 }, "n"));
        assert!(!check(doc! { "title": "b" }, doc! { "title": "a" }, "title"));
    }
}
