//! Normalization of raw query results into hydrated models.
//!
//! A query can come back as a cursor of documents, a single document, or some other
//! value (a count, an acknowledgement, nothing at all). [`ResultNormalizer`] turns the
//! first two into [`Model`] instances and hands everything else back untouched.

use bson::{Bson, Document};
use std::sync::Arc;

use crate::{
    error::{ModelError, ModelResult},
    model::Model,
    schema::{DEFAULT_PRIMARY_KEY, ModelSchema},
    value::{Value, bson_kind},
};

/// What a raw query execution returned.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Every document a cursor yielded, in cursor order.
    Cursor(Vec<Bson>),
    /// A single document.
    Document(Document),
    /// Anything else.
    Value(Bson),
}

impl QueryResult {
    /// Drains a cursor-like iterator eagerly.
    pub fn cursor(documents: impl IntoIterator<Item = Bson>) -> Self {
        QueryResult::Cursor(documents.into_iter().collect())
    }
}

/// A query result after normalization.
#[derive(Debug)]
pub enum Normalized {
    /// One outcome per cursor document, in cursor order. A record that fails to hydrate
    /// does not affect its siblings.
    Models(Vec<ModelResult<Model>>),
    /// A single hydrated document.
    Model(Model),
    /// A value passed through unchanged.
    Value(Bson),
}

impl Normalized {
    /// Collects the hydrated models, failing on the first rejected record.
    ///
    /// A passed-through value yields no models.
    pub fn into_models(self) -> ModelResult<Vec<Model>> {
        match self {
            Normalized::Models(models) => models.into_iter().collect(),
            Normalized::Model(model) => Ok(vec![model]),
            Normalized::Value(_) => Ok(Vec::new()),
        }
    }

    pub fn into_value(self) -> Option<Bson> {
        match self {
            Normalized::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Hydrates raw documents into models of one schema.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    schema: Arc<ModelSchema>,
}

impl ResultNormalizer {
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self { schema }
    }

    /// Routes a query result to bulk hydration, single hydration or pass-through.
    ///
    /// A bare value is hydrated as a document only when it is a document carrying `_id`
    /// or the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::HydrationFailure`] when a single document cannot be hydrated.
    /// Cursor records report their failures individually.
    pub fn normalize(&self, result: QueryResult) -> ModelResult<Normalized> {
        match result {
            QueryResult::Cursor(documents) => Ok(Normalized::Models(self.hydrate(documents))),
            QueryResult::Document(document) => Ok(Normalized::Model(self.hydrate_document(document)?)),
            QueryResult::Value(Bson::Document(document))
                if document.contains_key(DEFAULT_PRIMARY_KEY)
                    || document.contains_key(&self.schema.primary_key) =>
            {
                Ok(Normalized::Model(self.hydrate_document(document)?))
            }
            QueryResult::Value(value) => Ok(Normalized::Value(value)),
        }
    }

    /// Hydrates every raw document, preserving order.
    pub fn hydrate(&self, raw: Vec<Bson>) -> Vec<ModelResult<Model>> {
        raw.into_iter().map(|doc| self.hydrate_one(doc)).collect()
    }

    /// Hydrates one raw document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::HydrationFailure`] if `raw` is not a document or one of its
    /// cast attributes cannot be brought into stored form. No model is produced then.
    pub fn hydrate_one(&self, raw: Bson) -> ModelResult<Model> {
        match raw {
            Bson::Document(document) => self.hydrate_document(document),
            other => Err(ModelError::HydrationFailure(format!(
                "expected a document, got {}",
                bson_kind(&other)
            ))),
        }
    }

    fn hydrate_document(&self, raw: Document) -> ModelResult<Model> {
        let mut attributes = Document::new();

        for (key, value) in raw {
            let stored = match self.schema.caster(&key) {
                Some(caster) if value != Bson::Null => caster
                    .write(Value::Bson(value))
                    .map_err(|e| ModelError::HydrationFailure(format!("attribute {key}: {e}")))?,
                _ => value,
            };

            attributes.insert(key, stored);
        }

        Ok(Model::from_stored(self.schema.clone(), attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cast::CasterKind, model::{HasAttributes, Keyed}};
    use bson::{DateTime as BsonDateTime, doc, oid::ObjectId};

    const HEX: &str = "5f1d7a3c9b1e8a0012345678";

    fn normalizer() -> ResultNormalizer {
        ResultNormalizer::new(Arc::new(
            ModelSchema::new("users").cast("seen_at", CasterKind::DateTime),
        ))
    }

    #[test]
    fn cursor_hydrates_in_order_with_synced_snapshots() {
        let cursor = QueryResult::cursor((1..=3).map(|n| Bson::Document(doc! { "n": n })));

        let Normalized::Models(models) = normalizer().normalize(cursor).unwrap() else {
            panic!("expected models");
        };

        assert_eq!(models.len(), 3);
        for (i, model) in models.into_iter().enumerate() {
            let model = model.unwrap();

            assert!(model.exists());
            assert_eq!(model.get_raw("n"), Some(&Bson::Int32(i as i32 + 1)));
            assert_eq!(model.attributes(), model.original_attributes());
            assert!(model.is_attribute_unchanged("n"));
        }
    }

    #[test]
    fn single_document_materializes_identifier_handle() {
        let result = QueryResult::Document(doc! { "_id": HEX, "name": "Ada" });

        let Normalized::Model(model) = normalizer().normalize(result).unwrap() else {
            panic!("expected a model");
        };

        assert_eq!(model.key(), Some(&Bson::ObjectId(ObjectId::parse_str(HEX).unwrap())));
        assert!(model.is_attribute_unchanged("_id"));
    }

    #[test]
    fn document_value_with_key_is_hydrated() {
        let oid = ObjectId::new();
        let result = QueryResult::Value(Bson::Document(doc! { "_id": oid }));

        assert!(matches!(normalizer().normalize(result).unwrap(), Normalized::Model(_)));
    }

    #[test]
    fn document_value_with_store_id_is_hydrated_under_renamed_key() {
        let normalizer = ResultNormalizer::new(Arc::new(
            ModelSchema::new("sessions").primary_key("uuid"),
        ));

        let by_id = normalizer
            .normalize(QueryResult::Value(Bson::Document(doc! { "_id": ObjectId::new() })))
            .unwrap();
        let by_key = normalizer
            .normalize(QueryResult::Value(Bson::Document(doc! { "uuid": ObjectId::new() })))
            .unwrap();

        assert!(matches!(by_id, Normalized::Model(_)));
        assert!(matches!(by_key, Normalized::Model(_)));
    }

    #[test]
    fn other_values_pass_through() {
        let count = normalizer().normalize(QueryResult::Value(Bson::Int64(5))).unwrap();
        assert_eq!(count.into_value(), Some(Bson::Int64(5)));

        let keyless = normalizer()
            .normalize(QueryResult::Value(Bson::Document(doc! { "ok": 1 })))
            .unwrap();
        assert_eq!(keyless.into_value(), Some(Bson::Document(doc! { "ok": 1 })));
    }

    #[test]
    fn failed_records_do_not_affect_siblings() {
        let cursor = QueryResult::Cursor(vec![
            Bson::Document(doc! { "_id": ObjectId::new() }),
            Bson::Document(doc! { "_id": "nope" }),
            Bson::Int32(3),
            Bson::Document(doc! { "seen_at": BsonDateTime::now() }),
        ]);

        let Normalized::Models(models) = normalizer().normalize(cursor).unwrap() else {
            panic!("expected models");
        };

        assert!(models[0].is_ok());
        assert!(matches!(models[1], Err(ModelError::HydrationFailure(_))));
        assert!(matches!(models[2], Err(ModelError::HydrationFailure(_))));
        assert!(models[3].is_ok());
    }

    #[test]
    fn single_hydration_failure_is_reported() {
        let result = QueryResult::Document(doc! { "seen_at": "yesterday" });

        assert!(matches!(
            normalizer().normalize(result),
            Err(ModelError::HydrationFailure(_)),
        ));
    }

    #[test]
    fn null_cast_attributes_are_kept() {
        let model = normalizer()
            .hydrate_one(Bson::Document(doc! { "_id": ObjectId::new(), "seen_at": null }))
            .unwrap();

        assert_eq!(model.get_raw("seen_at"), Some(&Bson::Null));
    }
}
