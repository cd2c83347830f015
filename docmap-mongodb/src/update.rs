//! Translation of backend operations into MongoDB update documents.

use bson::{Bson, Document, doc};

/// Builds the update documents sent for each field-level or array-level operation.
pub(crate) struct UpdateTranslator;

impl UpdateTranslator {
    pub(crate) fn set(fields: Document) -> Document {
        doc! { "$set": fields }
    }

    pub(crate) fn unset(fields: &[String]) -> Document {
        doc! {
            "$unset": fields
                .iter()
                .map(|field| (field.clone(), Bson::String(String::new())))
                .collect::<Document>(),
        }
    }

    /// `$addToSet` skips values already present, `$push` appends unconditionally.
    pub(crate) fn push(field: &str, values: Vec<Bson>, unique: bool) -> Document {
        let operator = if unique { "$addToSet" } else { "$push" };

        doc! { operator: { field: { "$each": values } } }
    }

    /// `$pullAll` removes every occurrence of every listed value.
    pub(crate) fn pull(field: &str, values: Vec<Bson>) -> Document {
        doc! { "$pullAll": { field: values } }
    }
}
