#![allow(dead_code)]

use docrest::prelude::*;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn users_schema() -> Schema {
    Schema::builder("users")
        .id("username", IdKind::String)
        .field(FieldDescriptor::string("username"))
        .field(FieldDescriptor::email("email"))
        .field(FieldDescriptor::int("age"))
        .field(FieldDescriptor::boolean("active"))
        .field(FieldDescriptor::list("tags", FieldDescriptor::string("tag")))
        .field(FieldDescriptor::string("password"))
        .build()
}

pub fn store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::new())
}

pub fn body(value: Value) -> RequestArgs {
    RequestArgs::new().with_body(value)
}

pub fn query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> RequestArgs {
    pairs
        .into_iter()
        .fold(RequestArgs::new(), |args, (key, value)| args.with_query(key, value))
}

/// Creates `count` users named `user0`, `user1`, ... aged 20, 21, ...
/// Even-numbered users are active.
pub async fn seed_users<B: StoreBackend + 'static>(resource: &Resource<B>, count: usize) {
    for i in 0..count {
        let tags = if i % 2 == 0 { vec!["even"] } else { vec!["odd", "prime"] };
        let response = resource
            .handle(
                Verb::Post,
                &body(json!({
                    "username": format!("user{i}"),
                    "email": format!("user{i}@example.com"),
                    "age": 20 + i,
                    "active": i % 2 == 0,
                    "tags": tags,
                })),
            )
            .await;
        assert_eq!(response.status, 200, "seeding failed: {}", response.body);
    }
}

pub fn usernames(data: &Value) -> Vec<String> {
    data.as_array()
        .expect("data is an array")
        .iter()
        .map(|record| record["username"].as_str().expect("username").to_string())
        .collect()
}
