use bson::{Bson, doc, oid::ObjectId};
use docmap::{
    Model,
    backend::{RawExpression, StoreBackend, StoreBackendBuilder},
    error::ModelError,
    logging::{self, Profile},
    memory::InMemoryStore,
    model::{HasAttributes, Keyed},
    result::{Normalized, QueryResult, ResultNormalizer},
    store::DocumentStore,
};

#[derive(Model)]
#[model(collection = "users", dates(deleted_at))]
pub struct User;

async fn store() -> DocumentStore<InMemoryStore> {
    logging::init(Profile::Test);
    DocumentStore::new(InMemoryStore::builder().build().await.unwrap())
}

fn ints(values: &[i32]) -> Vec<Bson> {
    values.iter().map(|v| Bson::Int32(*v)).collect()
}

#[tokio::test]
async fn save_inserts_with_generated_key_then_updates_dirty_fields() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = users.new_model();
    user.set_stored_value("name", "Ada").unwrap();
    users.save(&mut user).await.unwrap();

    assert!(user.exists());
    assert!(matches!(user.key(), Some(Bson::ObjectId(_))));
    assert!(user.dirty().is_empty());

    user.set_stored_value("name", "Grace").unwrap();
    assert_eq!(user.dirty(), doc! { "name": "Grace" });
    users.save(&mut user).await.unwrap();

    let found = users.first(doc! { "name": "Grace" }).await.unwrap().unwrap();
    assert_eq!(found.key(), user.key());
    assert!(user.is_attribute_unchanged("name"));
}

#[tokio::test]
async fn find_hydrates_in_cursor_order() {
    let store = store().await;
    let users = store.model::<User>();

    for n in 1..=3 {
        let mut user = users.new_model();
        user.set_stored_value("n", n).unwrap();
        users.save(&mut user).await.unwrap();
    }

    let found = users.find(doc! {}).await.unwrap();
    let ns: Vec<_> = found.iter().map(|user| user.get_raw("n").cloned()).collect();

    assert_eq!(ns, vec![Some(Bson::Int32(1)), Some(Bson::Int32(2)), Some(Bson::Int32(3))]);
    assert!(found.iter().all(|user| user.attributes() == user.original_attributes()));
}

#[tokio::test]
async fn push_and_pull_keep_store_and_model_in_step() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = users.new_model();
    user.set_stored_value("tags", ints(&[1, 2, 3])).unwrap();
    users.save(&mut user).await.unwrap();

    let pushed = users.push(&mut user, "tags", ints(&[2, 4]), true).await.unwrap();
    assert_eq!(pushed, ints(&[1, 2, 3, 4]));
    assert!(user.is_attribute_unchanged("tags"));

    let pulled = users.pull(&mut user, "tags", ints(&[1, 3])).await.unwrap();
    assert_eq!(pulled, ints(&[2, 4]));

    let stored = users.first(user.document_key().unwrap().filter()).await.unwrap().unwrap();
    assert_eq!(stored.get_raw("tags"), Some(&Bson::Array(ints(&[2, 4]))));
}

#[tokio::test]
async fn push_onto_scalar_field_is_rejected_and_model_untouched() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = users.new_model();
    user.set_stored_value("tags", "plain").unwrap();
    users.save(&mut user).await.unwrap();

    let err = users.push(&mut user, "tags", ints(&[1]), false).await.unwrap_err();

    assert!(matches!(err, ModelError::Backend(_)));
    assert_eq!(user.get_raw("tags"), Some(&Bson::String("plain".into())));
}

#[tokio::test]
async fn drop_fields_removes_from_store_and_model() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = users.new_model();
    user.set_stored_value("name", "Ada").unwrap();
    user.set_stored_value("deleted_at", "2024-01-01 00:00:00").unwrap();
    users.save(&mut user).await.unwrap();

    let matched = users.drop_fields(&mut user, vec!["deleted_at".into()]).await.unwrap();

    assert_eq!(matched, 1);
    assert_eq!(user.get_raw("deleted_at"), None);
    assert_eq!(user.get_original("deleted_at"), None);
    assert!(user.dirty().is_empty());

    let stored = users.first(doc! { "name": "Ada" }).await.unwrap().unwrap();
    assert!(!stored.attributes().contains_key("deleted_at"));
}

#[tokio::test]
async fn counts_pass_through_unchanged() {
    let store = store().await;
    let users = store.model::<User>();

    for _ in 0..5 {
        store
            .backend()
            .insert_document("users", doc! { "active": true })
            .await
            .unwrap();
    }

    assert_eq!(users.count(doc! { "active": true }).await.unwrap(), 5);

    let raw = users.raw(RawExpression::Count(doc! {})).await.unwrap();
    assert_eq!(raw.into_value(), Some(Bson::Int64(5)));
}

#[tokio::test]
async fn hydrated_string_identifier_becomes_handle() {
    let store = store().await;
    let users = store.model::<User>();
    let hex = "5f1d7a3c9b1e8a0012345678";

    store
        .backend()
        .insert_document("users", doc! { "_id": hex, "name": "Ada" })
        .await
        .unwrap();

    let user = users.first(doc! { "name": "Ada" }).await.unwrap().unwrap();

    assert_eq!(user.key(), Some(&Bson::ObjectId(ObjectId::parse_str(hex).unwrap())));
    assert!(user.is_attribute_unchanged("_id"));
}

#[tokio::test]
async fn missing_first_result_is_none() {
    let store = store().await;
    let users = store.model::<User>();

    assert!(users.first(doc! { "name": "nobody" }).await.unwrap().is_none());
    assert!(matches!(
        users.raw(RawExpression::FindOne(doc! { "name": "nobody" })).await.unwrap(),
        Normalized::Value(Bson::Null),
    ));
    assert!(matches!(
        store.backend().raw("users", RawExpression::Find(doc! {})).await.unwrap(),
        QueryResult::Cursor(docs) if docs.is_empty(),
    ));
}

#[tokio::test]
async fn saving_a_vanished_document_reports_not_found() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = ResultNormalizer::new(users.schema().clone())
        .hydrate_one(Bson::Document(doc! { "_id": ObjectId::new(), "name": "Ada" }))
        .unwrap();
    user.set_stored_value("name", "Grace").unwrap();

    let err = users.save(&mut user).await.unwrap_err();

    assert!(matches!(err, ModelError::DocumentNotFound(_, collection) if collection == "users"));
    assert!(!user.is_attribute_unchanged("name"));
}

#[tokio::test]
async fn save_unsets_attributes_removed_from_the_model() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = users.new_model();
    user.set_stored_value("name", "Ada").unwrap();
    user.set_stored_value("nick", "A").unwrap();
    users.save(&mut user).await.unwrap();

    user.unset("nick");
    user.set_stored_value("name", "Grace").unwrap();
    users.save(&mut user).await.unwrap();

    let stored = users.first(user.document_key().unwrap().filter()).await.unwrap().unwrap();
    assert_eq!(stored.get_raw("name"), Some(&Bson::String("Grace".into())));
    assert!(!stored.attributes().contains_key("nick"));
    assert!(user.removed().is_empty());

    // Unsetting alone is enough to trigger a write.
    user.unset("name");
    users.save(&mut user).await.unwrap();

    let stored = users.first(user.document_key().unwrap().filter()).await.unwrap().unwrap();
    assert!(!stored.attributes().contains_key("name"));
}

fn vanished(users: &docmap::builder::ModelQuery<'_, InMemoryStore>) -> docmap::model::Model {
    ResultNormalizer::new(users.schema().clone())
        .hydrate_one(Bson::Document(doc! { "_id": ObjectId::new(), "tags": [1], "nick": "A" }))
        .unwrap()
}

#[tokio::test]
async fn array_mutation_on_a_vanished_document_reports_not_found() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = vanished(&users);
    let before = user.to_document();

    let pushed = users.push(&mut user, "tags", ints(&[2]), false).await;
    assert!(matches!(pushed, Err(ModelError::DocumentNotFound(..))));

    let pulled = users.pull(&mut user, "tags", ints(&[1])).await;
    assert!(matches!(pulled, Err(ModelError::DocumentNotFound(..))));

    assert_eq!(user.to_document(), before);
    assert_eq!(user.original_attributes(), &before);
}

#[tokio::test]
async fn dropping_fields_of_a_vanished_document_reports_not_found() {
    let store = store().await;
    let users = store.model::<User>();

    let mut user = vanished(&users);

    let dropped = users.drop_fields(&mut user, vec!["nick".into()]).await;

    assert!(matches!(dropped, Err(ModelError::DocumentNotFound(..))));
    assert_eq!(user.get_raw("nick"), Some(&Bson::String("A".into())));
    assert_eq!(user.get_original("nick"), Some(&Bson::String("A".into())));
}
