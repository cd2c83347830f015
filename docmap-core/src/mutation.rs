//! In-memory array mutation.
//!
//! [`push_attribute_values`] and [`pull_attribute_values`] update an array attribute and then
//! mark it synchronized in the snapshot store. They do not talk to the store; callers that
//! also persist the change should issue the store operation and apply these only after it
//! is confirmed, as [`ModelQuery::push`](crate::builder::ModelQuery::push) does. Applied
//! on their own, they leave the in-memory view ahead of the durable one.
//!
//! Attributes that do not hold an array are treated as empty, and their previous value
//! is discarded.

use bson::Bson;

use crate::{model::HasAttributes, value::same_value};

/// Appends `values` to `current`, skipping values already present when `unique` is set.
///
/// Membership is checked against the sequence as it grows, so repeated values inside
/// `values` are also appended once.
pub fn appended(current: Option<&Bson>, values: Vec<Bson>, unique: bool) -> Vec<Bson> {
    let mut sequence = as_sequence(current);

    for value in values {
        if unique && sequence.iter().any(|item| same_value(item, &value)) {
            continue;
        }

        sequence.push(value);
    }

    sequence
}

/// Removes every occurrence of each of `values` from `current`. The result is dense.
pub fn pulled(current: Option<&Bson>, values: &[Bson]) -> Vec<Bson> {
    as_sequence(current)
        .into_iter()
        .filter(|item| !values.iter().any(|value| same_value(item, value)))
        .collect()
}

fn as_sequence(current: Option<&Bson>) -> Vec<Bson> {
    match current {
        Some(Bson::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Appends `values` to the array attribute `key` and synchronizes its snapshot.
///
/// Returns the updated sequence.
pub fn push_attribute_values<M>(model: &mut M, key: &str, values: Vec<Bson>, unique: bool) -> Vec<Bson>
where
    M: HasAttributes + ?Sized,
{
    let updated = appended(model.attributes().get(key), values, unique);

    write_back(model, key, updated)
}

/// Removes `values` from the array attribute `key` and synchronizes its snapshot.
///
/// Returns the updated sequence.
pub fn pull_attribute_values<M>(model: &mut M, key: &str, values: Vec<Bson>) -> Vec<Bson>
where
    M: HasAttributes + ?Sized,
{
    let updated = pulled(model.attributes().get(key), &values);

    write_back(model, key, updated)
}

fn write_back<M>(model: &mut M, key: &str, updated: Vec<Bson>) -> Vec<Bson>
where
    M: HasAttributes + ?Sized,
{
    model
        .attributes_mut()
        .insert(key, Bson::Array(updated.clone()));
    model.sync_original_attribute(key);

    updated
}
