mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::Document;
use docrest::prelude::*;

use common::{body, init_tracing, query, store, users_schema};

fn users() -> Resource<InMemoryStore> {
    Resource::builder(users_schema(), store())
        .exclude(["password"])
        .crud(List::default())
        .build()
}

#[tokio::test]
async fn create_retrieve_update_delete() {
    init_tracing();
    let resource = users();

    let created = resource
        .handle(
            Verb::Post,
            &body(json!({
                "username": "alice",
                "email": "alice@example.com",
                "age": "30",
                "tags": ["a", "b"],
                "password": "hunter2",
            })),
        )
        .await;
    assert_eq!(created.status, 200);
    assert_eq!(
        created.body,
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "age": 30,
            "tags": ["a", "b"],
        })
    );

    let retrieved = resource.handle(Verb::Get, &query([("username", "alice")])).await;
    assert_eq!(retrieved.status, 200);
    assert_eq!(retrieved.body, created.body);

    let updated = resource
        .handle(Verb::Patch, &body(json!({ "username": "alice", "age": 31 })))
        .await;
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["age"], json!(31));
    assert_eq!(updated.body["email"], json!("alice@example.com"));
    assert_eq!(updated.body["tags"], json!(["a", "b"]));

    let deleted = resource.handle(Verb::Delete, &query([("username", "alice")])).await;
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.body, json!({ "msg": "ok" }));

    let gone = resource.handle(Verb::Get, &query([("username", "alice")])).await;
    assert_eq!(gone.status, 404);
    assert_eq!(
        gone.body,
        json!({ "msg": "could not find users with username=alice", "error": 1 })
    );
}

#[tokio::test]
async fn excluded_fields_are_stored_but_not_returned() {
    let resource = users();
    resource
        .handle(Verb::Post, &body(json!({ "username": "bob", "password": "secret" })))
        .await;

    let stored = resource
        .context()
        .collection()
        .find_one(&DocumentId::from("bob"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.as_document().unwrap().get_str("password").unwrap(), "secret");

    let listed = resource.handle(Verb::Get, &RequestArgs::new()).await;
    assert!(listed.body["data"][0].get("password").is_none());
}

#[tokio::test]
async fn string_identifiers_must_be_supplied() {
    let resource = users();
    let response = resource.handle(Verb::Post, &body(json!({ "age": 3 }))).await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body, json!({ "msg": "username is required", "error": 1 }));
}

#[tokio::test]
async fn required_fields_are_enforced() {
    let schema = Schema::builder("accounts")
        .field(FieldDescriptor::email("email").required())
        .field(FieldDescriptor::string("plan").with_default("free"))
        .build();
    let resource = Resource::builder(schema, store()).create().build();

    let missing = resource.handle(Verb::Post, &body(json!({ "plan": "pro" }))).await;
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body["msg"], json!("email is required"));

    let created = resource
        .handle(Verb::Post, &body(json!({ "email": "a@example.com" })))
        .await;
    assert_eq!(created.status, 200);
    assert_eq!(created.body["plan"], json!("free"));
    assert!(created.body["id"]["$oid"].is_string());
}

#[tokio::test]
async fn invalid_values_are_rejected() {
    let resource = users();
    let response = resource
        .handle(Verb::Post, &body(json!({ "username": "carol", "age": "old" })))
        .await;

    assert_eq!(response.status, 400);
    assert!(response.body["msg"].as_str().unwrap().starts_with("age:"));
}

#[tokio::test]
async fn duplicate_identifiers_fail_to_persist() {
    let resource = users();
    let first = resource.handle(Verb::Post, &body(json!({ "username": "dave" }))).await;
    let second = resource.handle(Verb::Post, &body(json!({ "username": "dave" }))).await;

    assert_eq!(first.status, 200);
    assert_eq!(second.status, 400);
    assert_eq!(second.body["error"], json!(1));
}

#[tokio::test]
async fn read_only_fields_survive_updates() {
    let resource = Resource::builder(users_schema(), store())
        .read_only(["email"])
        .crud(List::default())
        .build();

    resource
        .handle(Verb::Post, &body(json!({ "username": "erin", "email": "erin@example.com" })))
        .await;
    let updated = resource
        .handle(
            Verb::Put,
            &body(json!({ "username": "erin", "email": "other@example.com", "age": 5 })),
        )
        .await;

    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["email"], json!("erin@example.com"));
    assert_eq!(updated.body["age"], json!(5));
}

#[tokio::test]
async fn updating_a_missing_record_is_not_found() {
    let response = users()
        .handle(Verb::Patch, &body(json!({ "username": "nobody", "age": 1 })))
        .await;

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn unanswered_verbs_are_not_allowed() {
    let resource = Resource::builder(users_schema(), store())
        .list(List::default())
        .build();

    assert_eq!(resource.verbs(), vec![Verb::Get]);

    let response = resource.handle(Verb::Post, &body(json!({ "username": "frank" }))).await;
    assert_eq!(response.status, 405);
    assert_eq!(response.body, json!({ "msg": "method POST is not allowed", "error": 1 }));
}

#[tokio::test]
async fn field_overrides_replace_generated_arguments() {
    let resource = Resource::builder(users_schema(), store())
        .field_overrides(
            Parser::new().with(ArgumentSpec::new("age", Coercer::Integer).with_default(18_i64)),
        )
        .create()
        .build();

    let created = resource.handle(Verb::Post, &body(json!({ "username": "gina" }))).await;
    assert_eq!(created.body["age"], json!(18));
}

/// Accepts reads but refuses every write.
#[derive(Debug, Default)]
struct ReadOnlyStore(InMemoryStore);

#[async_trait]
impl StoreBackend for ReadOnlyStore {
    async fn insert_documents(&self, _documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        Err(DocumentStoreError::Backend(format!("{collection} is read only")))
    }

    async fn update_documents(&self, _documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        Err(DocumentStoreError::Backend(format!("{collection} is read only")))
    }

    async fn delete_documents(&self, _ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<()> {
        Err(DocumentStoreError::Backend(format!("{collection} is read only")))
    }

    async fn get_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.0.get_documents(ids, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.0.query_documents(query, collection).await
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<usize> {
        self.0.count_documents(filter, collection).await
    }
}

#[tokio::test]
async fn store_write_failures_are_persistence_errors() {
    let resource = Resource::builder(users_schema(), DocumentStore::new(ReadOnlyStore::default()))
        .crud(List::default())
        .build();

    let response = resource.handle(Verb::Post, &body(json!({ "username": "hank" }))).await;

    assert_eq!(response.status, 400);
    assert!(response.body["msg"].as_str().unwrap().contains("read only"));
}

#[tokio::test]
async fn id_is_accepted_for_a_renamed_identifier() {
    let resource = users();
    let created = resource
        .handle(Verb::Post, &body(json!({ "username": "user0", "age": 20 })))
        .await;
    assert_eq!(created.status, 200);

    let retrieved = resource.handle(Verb::Get, &query([("id", "user0")])).await;
    assert_eq!(retrieved.status, 200);
    assert_eq!(retrieved.body, created.body);

    let deleted = resource.handle(Verb::Delete, &query([("id", "user0")])).await;
    assert_eq!(deleted.status, 200);
}

#[tokio::test]
async fn post_create_hook_sees_the_stored_record() {
    let seen: Arc<Mutex<Vec<(Verb, Document)>>> = Arc::default();
    let recorder = Arc::clone(&seen);

    let resource = Resource::builder(users_schema(), store())
        .exclude(["password"])
        .create_with(Create::new().after(move |ctx: &HookContext<'_>, record: &Document| {
            recorder.lock().unwrap().push((ctx.verb, record.clone()));
        }))
        .build();

    let created = resource
        .handle(Verb::Post, &body(json!({ "username": "frank", "password": "pw" })))
        .await;
    assert_eq!(created.status, 200);
    assert!(created.body.get("password").is_none());

    let rejected = resource
        .handle(Verb::Post, &body(json!({ "username": "gina", "age": "old" })))
        .await;
    assert_eq!(rejected.status, 400);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, Verb::Post);
    assert_eq!(seen[0].1.get_str("username").unwrap(), "frank");
    assert_eq!(seen[0].1.get_str("password").unwrap(), "pw");
}
