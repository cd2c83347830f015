//! Filter evaluation for in-memory documents.
//!
//! Supports the subset of the native filter syntax the in-memory store needs: field
//! equality (with array membership), `$and`/`$or`, dotted paths, and the operators
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists`.

use bson::{Bson, Document};
use std::cmp::Ordering;

use docmap_core::{
    error::{ModelError, ModelResult},
    value::same_value,
};

/// Orderable view of a BSON value. Numbers are normalized to `f64`.
#[derive(Debug)]
enum Comparable<'a> {
    Number(f64),
    String(&'a str),
    DateTime(i64),
    Bool(bool),
    ObjectId([u8; 12]),
}

impl<'a> Comparable<'a> {
    fn of(value: &'a Bson) -> Option<Self> {
        match value {
            Bson::Int32(v) => Some(Comparable::Number(f64::from(*v))),
            Bson::Int64(v) => Some(Comparable::Number(*v as f64)),
            Bson::Double(v) => Some(Comparable::Number(*v)),
            Bson::String(v) => Some(Comparable::String(v)),
            Bson::DateTime(v) => Some(Comparable::DateTime(v.timestamp_millis())),
            Bson::Boolean(v) => Some(Comparable::Bool(*v)),
            Bson::ObjectId(v) => Some(Comparable::ObjectId(v.bytes())),
            _ => None,
        }
    }
}

/// Orders two values of the same kind. Values of different kinds do not compare.
fn compare(left: &Bson, right: &Bson) -> Option<Ordering> {
    match (Comparable::of(left)?, Comparable::of(right)?) {
        (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(&b),
        (Comparable::String(a), Comparable::String(b)) => Some(a.cmp(b)),
        (Comparable::DateTime(a), Comparable::DateTime(b)) => Some(a.cmp(&b)),
        (Comparable::Bool(a), Comparable::Bool(b)) => Some(a.cmp(&b)),
        (Comparable::ObjectId(a), Comparable::ObjectId(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

/// Resolves a possibly dotted path inside `document`.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Equality as the store applies it: arrays also match when any element matches.
fn equals(field: Option<&Bson>, expected: &Bson) -> bool {
    match field {
        Some(field @ Bson::Array(items)) => {
            same_value(field, expected) || items.iter().any(|item| same_value(item, expected))
        }
        Some(value) => same_value(value, expected),
        None => *expected == Bson::Null,
    }
}

fn ordered(field: Option<&Bson>, expected: &Bson, accept: fn(Ordering) -> bool) -> bool {
    match field {
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare(item, expected).is_some_and(accept)),
        Some(value) => compare(value, expected).is_some_and(accept),
        None => false,
    }
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(doc) if !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')) => Some(doc),
        _ => None,
    }
}

fn as_list<'a>(operator: &str, value: &'a Bson) -> ModelResult<&'a Vec<Bson>> {
    value
        .as_array()
        .ok_or_else(|| ModelError::Backend(format!("{operator} requires an array")))
}

fn apply_operator(field: Option<&Bson>, operator: &str, operand: &Bson) -> ModelResult<bool> {
    Ok(match operator {
        "$eq" => equals(field, operand),
        "$ne" => !equals(field, operand),
        "$gt" => ordered(field, operand, Ordering::is_gt),
        "$gte" => ordered(field, operand, Ordering::is_ge),
        "$lt" => ordered(field, operand, Ordering::is_lt),
        "$lte" => ordered(field, operand, Ordering::is_le),
        "$in" => as_list(operator, operand)?
            .iter()
            .any(|candidate| equals(field, candidate)),
        "$nin" => !as_list(operator, operand)?
            .iter()
            .any(|candidate| equals(field, candidate)),
        "$exists" => field.is_some() == matches!(operand, Bson::Boolean(true) | Bson::Int32(1) | Bson::Int64(1)),
        other => return Err(ModelError::Backend(format!("unsupported filter operator {other}"))),
    })
}

/// Returns whether `document` satisfies `filter`.
///
/// # Errors
///
/// Returns [`ModelError::Backend`] for operators outside the supported subset or
/// malformed operands.
pub(crate) fn matches(document: &Document, filter: &Document) -> ModelResult<bool> {
    for (field, condition) in filter {
        let satisfied = match field.as_str() {
            "$and" | "$or" => {
                let clauses = as_list(field, condition)?
                    .iter()
                    .map(|clause| match clause {
                        Bson::Document(clause) => matches(document, clause),
                        _ => Err(ModelError::Backend(format!("{field} clauses must be documents"))),
                    })
                    .collect::<ModelResult<Vec<bool>>>()?;

                if field == "$and" {
                    clauses.into_iter().all(|c| c)
                } else {
                    clauses.into_iter().any(|c| c)
                }
            }
            _ => {
                let value = lookup(document, field);

                match is_operator_document(condition) {
                    Some(operators) => {
                        let mut all = true;
                        for (operator, operand) in operators {
                            all &= apply_operator(value, operator, operand)?;
                        }
                        all
                    }
                    None => equals(value, condition),
                }
            }
        };

        if !satisfied {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn sample() -> Document {
        doc! {
            "name": "Ada",
            "age": 36,
            "tags": ["math", "engines"],
            "address": { "city": "London" },
        }
    }

    #[test]
    fn equality_and_array_membership() {
        assert!(matches(&sample(), &doc! { "name": "Ada" }).unwrap());
        assert!(matches(&sample(), &doc! { "age": 36.0 }).unwrap());
        assert!(matches(&sample(), &doc! { "tags": "math" }).unwrap());
        assert!(!matches(&sample(), &doc! { "tags": "poetry" }).unwrap());
        assert!(matches(&sample(), &doc! { "tags": ["math", "engines"] }).unwrap());
        assert!(!matches(&sample(), &doc! { "tags": ["engines", "math"] }).unwrap());
        assert!(matches(&sample(), &doc! { "missing": null }).unwrap());
    }

    #[test]
    fn dotted_paths_resolve() {
        assert!(matches(&sample(), &doc! { "address.city": "London" }).unwrap());
        assert!(matches(&sample(), &doc! { "tags.1": "engines" }).unwrap());
    }

    #[test]
    fn comparison_operators() {
        assert!(matches(&sample(), &doc! { "age": { "$gt": 30, "$lte": 36 } }).unwrap());
        assert!(!matches(&sample(), &doc! { "age": { "$lt": 36 } }).unwrap());
        assert!(matches(&sample(), &doc! { "name": { "$in": ["Ada", "Grace"] } }).unwrap());
        assert!(matches(&sample(), &doc! { "name": { "$nin": ["Grace"] } }).unwrap());
        assert!(matches(&sample(), &doc! { "nick": { "$exists": false } }).unwrap());
        assert!(!matches(&sample(), &doc! { "age": { "$gt": "30" } }).unwrap());
    }

    #[test]
    fn logical_clauses() {
        assert!(matches(&sample(), &doc! { "$or": [{ "name": "Grace" }, { "age": 36 }] }).unwrap());
        assert!(!matches(&sample(), &doc! { "$and": [{ "name": "Grace" }, { "age": 36 }] }).unwrap());
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        assert!(matches(&sample(), &doc! { "name": { "$regex": "A" } }).is_err());
    }
}
