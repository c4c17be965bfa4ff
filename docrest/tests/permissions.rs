mod common;

use std::sync::{Arc, Mutex};

use docrest::prelude::*;

use common::{body, query, seed_users, store, users_schema};

#[tokio::test]
async fn denied_deletes_leave_the_record() {
    let permissions = Permissions::per_verb()
        .on(Verb::Delete, |_ctx: &HookContext<'_>| Err(PermissionDenied::forbidden("deleting users is disabled")));
    let resource = Resource::builder(users_schema(), store())
        .permissions(permissions)
        .crud(List::default())
        .build();
    seed_users(&resource, 1).await;

    let denied = resource.handle(Verb::Delete, &query([("username", "user0")])).await;
    assert_eq!(denied.status, 403);
    assert_eq!(denied.body, json!({ "msg": "deleting users is disabled", "error": 1 }));

    let still_there = resource.handle(Verb::Get, &query([("username", "user0")])).await;
    assert_eq!(still_there.status, 200);
}

#[tokio::test]
async fn denied_creates_never_reach_the_store() {
    let resource = Resource::builder(users_schema(), store())
        .permissions(Permissions::single(|ctx: &HookContext<'_>| match ctx.verb {
            Verb::Get => Ok(()),
            _ => Err(PermissionDenied::unauthorized("login required")),
        }))
        .crud(List::default())
        .build();

    let denied = resource.handle(Verb::Post, &body(json!({ "username": "mallory" }))).await;
    assert_eq!(denied.status, 401);

    let listed = resource.handle(Verb::Get, &RequestArgs::new()).await;
    assert_eq!(listed.body["total"], json!(0));
}

#[tokio::test]
async fn hooks_run_before_validation() {
    let resource = Resource::builder(users_schema(), store())
        .permissions(Permissions::single(|_ctx: &HookContext<'_>| Err(PermissionDenied::forbidden("no"))))
        .crud(List::default())
        .build();

    // The body is invalid, but the hook answers first
    let response = resource.handle(Verb::Post, &body(json!({ "age": "old" }))).await;
    assert_eq!(response.status, 403);
}

#[tokio::test]
async fn hooks_see_the_request() {
    let seen: Arc<Mutex<Vec<(String, Verb, bool)>>> = Arc::default();
    let recorder = Arc::clone(&seen);

    let resource = Resource::builder(users_schema(), store())
        .permissions(Permissions::single(move |ctx: &HookContext<'_>| {
            recorder
                .lock()
                .unwrap()
                .push((ctx.resource.to_string(), ctx.verb, ctx.args.contains("username")));
            Ok(())
        }))
        .crud(List::default())
        .build();

    resource.handle(Verb::Post, &body(json!({ "username": "trent" }))).await;
    resource.handle(Verb::Get, &RequestArgs::new()).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("users".to_string(), Verb::Post, true),
            ("users".to_string(), Verb::Get, false),
        ]
    );
}

#[tokio::test]
async fn per_verb_hooks_keep_shared_hooks() {
    let permissions = Permissions::single(|ctx: &HookContext<'_>| {
        if ctx.args.contains("token") {
            Ok(())
        } else {
            Err(PermissionDenied::unauthorized("token required"))
        }
    })
    .on(Verb::Delete, |_ctx: &HookContext<'_>| Err(PermissionDenied::forbidden("never")));

    let resource = Resource::builder(users_schema(), store())
        .permissions(permissions)
        .crud(List::default())
        .build();

    let anonymous = resource.handle(Verb::Get, &RequestArgs::new()).await;
    assert_eq!(anonymous.status, 401);

    let authorized = resource.handle(Verb::Get, &query([("token", "t")])).await;
    assert_eq!(authorized.status, 200);

    let delete = resource
        .handle(Verb::Delete, &query([("token", "t"), ("username", "x")]))
        .await;
    assert_eq!(delete.status, 403);
}

#[tokio::test]
async fn object_hooks_guard_the_loaded_record() {
    let resource = Resource::builder(users_schema(), store())
        .object_permission(|_ctx: &HookContext<'_>, record: &bson::Document| {
            match record.get_bool("active") {
                Ok(true) => Ok(()),
                _ => Err(PermissionDenied::forbidden("inactive users are locked")),
            }
        })
        .crud(List::default())
        .build();
    seed_users(&resource, 2).await;

    let active = resource.handle(Verb::Get, &query([("username", "user0")])).await;
    assert_eq!(active.status, 200);

    let locked = resource.handle(Verb::Get, &query([("username", "user1")])).await;
    assert_eq!(locked.status, 403);
    assert_eq!(locked.body, json!({ "msg": "inactive users are locked", "error": 1 }));

    let update = resource
        .handle(Verb::Patch, &body(json!({ "username": "user1", "age": 99 })))
        .await;
    assert_eq!(update.status, 403);

    let delete = resource.handle(Verb::Delete, &query([("username", "user1")])).await;
    assert_eq!(delete.status, 403);

    let listed = resource.handle(Verb::Get, &RequestArgs::new()).await;
    assert_eq!(listed.body["total"], json!(2));
    assert_eq!(listed.body["data"][1]["age"], json!(21));
}
