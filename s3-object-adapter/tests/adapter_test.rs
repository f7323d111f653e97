/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use bytes::Bytes;

use s3_object_adapter::connection::ConnectionState;
use s3_object_adapter::error::ErrorKind;
use s3_object_adapter::types::{AddressingMode, ListedObject, ObjectIdentity, Outcome};
use s3_object_adapter::{Client, Config};
use test_common::{FlakyConnector, InMemoryStore};

const ACCOUNT: &str = "acct";
const CONTAINER: &str = "cont";

fn client(store: &InMemoryStore, mode: AddressingMode) -> Client {
    let config = Config::builder()
        .addressing_mode(mode)
        .max_retries(2)
        .connector(FlakyConnector::new(store.clone()))
        .build();
    Client::new(config)
}

fn id(object_name: &str) -> ObjectIdentity {
    ObjectIdentity::new(ACCOUNT, CONTAINER, object_name)
        .with_source("src")
        .with_process("proc")
}

fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn paths(objects: &[ListedObject]) -> Vec<(Option<String>, Option<String>, String)> {
    let mut paths: Vec<_> = objects
        .iter()
        .map(|o| {
            (
                o.source().map(str::to_owned),
                o.process().map(str::to_owned),
                o.object_name().to_owned(),
            )
        })
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_put_creates_bucket_and_get_reads_back() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);

    assert!(client.put_object(&id("obj"), "hello").await.unwrap());
    assert!(store.has_bucket(CONTAINER));
    assert_eq!(vec!["src/proc/obj".to_owned()], store.keys(CONTAINER));
    assert_eq!(Bytes::from_static(b"hello"), client.get_object(&id("obj")).await.unwrap());
}

#[tokio::test]
async fn test_account_as_bucket_layout() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::AccountAsBucket);

    client.put_object(&id("obj"), "hello").await.unwrap();
    assert!(!store.has_bucket(CONTAINER));
    assert_eq!(vec!["cont/src/proc/obj".to_owned()], store.keys(ACCOUNT));

    // read back with a per-call mode override
    let body = client
        .get_object_with_mode(&id("obj"), AddressingMode::AccountAsBucket)
        .await
        .unwrap();
    assert_eq!(Bytes::from_static(b"hello"), body);
    let err = client
        .get_object_with_mode(&id("obj"), AddressingMode::ContainerAsBucket)
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
}

#[tokio::test]
async fn test_get_missing_object_is_unavailable() {
    let store = InMemoryStore::new().with_bucket(CONTAINER);
    let client = client(&store, AddressingMode::ContainerAsBucket);

    let err = client.get_object(&id("missing")).await.unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
}

#[tokio::test]
async fn test_exists() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);

    assert!(!client.exists(&id("obj")).await);
    client.put_object(&id("obj"), "hello").await.unwrap();
    assert!(client.exists(&id("obj")).await);

    store.set_offline(true);
    assert!(!client.exists(&id("obj")).await);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);
    client.put_object(&id("obj"), "hello").await.unwrap();

    assert!(client.delete_object(&id("obj")).await.unwrap());
    assert!(client.delete_object(&id("obj")).await.unwrap());
    assert!(!client.exists(&id("obj")).await);

    // no bucket at all
    let other = ObjectIdentity::new(ACCOUNT, "other", "obj");
    assert!(client.delete_object(&other).await.unwrap());
    assert!(client
        .delete_object_with_mode(&other, AddressingMode::AccountAsBucket)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_metadata_merge() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);
    let id = id("obj");
    client.put_object(&id, "hello").await.unwrap();
    assert!(client.get_metadata(&id).await.unwrap().is_empty());

    let merged = client
        .add_object_metadata(&id, map(&[("a", "1")]))
        .await
        .unwrap();
    assert_eq!(map(&[("a", "1")]), merged);

    client
        .add_object_metadata(&id, map(&[("b", "2")]))
        .await
        .unwrap();
    assert_eq!(map(&[("a", "1"), ("b", "2")]), client.get_metadata(&id).await.unwrap());

    let merged = client
        .add_object_metadata(&id, map(&[("a", "9")]))
        .await
        .unwrap();
    assert_eq!(map(&[("a", "9"), ("b", "2")]), merged);
    assert_eq!(merged, client.get_metadata(&id).await.unwrap());

    // the body survives the rewrite
    assert_eq!(Bytes::from_static(b"hello"), client.get_object(&id).await.unwrap());
}

#[tokio::test]
async fn test_metadata_single_entry() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::AccountAsBucket);
    let id = id("obj");
    client.put_object(&id, "hello").await.unwrap();

    client
        .add_object_metadata_entry(&id, "status", Some("uploaded"))
        .await
        .unwrap();
    let merged = client
        .add_object_metadata_entry(&id, "reason", None)
        .await
        .unwrap();
    assert_eq!(map(&[("status", "uploaded"), ("reason", "")]), merged);
}

#[tokio::test]
async fn test_metadata_of_missing_object_is_unavailable() {
    let store = InMemoryStore::new().with_bucket(CONTAINER);
    let client = client(&store, AddressingMode::ContainerAsBucket);

    let err = client.get_metadata(&id("missing")).await.unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
    let err = client
        .add_object_metadata(&id("missing"), map(&[("a", "1")]))
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
}

#[tokio::test]
async fn test_metadata_on_body_larger_than_read_limit() {
    let store = InMemoryStore::new();
    let config = Config::builder()
        .read_limit(4)
        .connector(FlakyConnector::new(store.clone()))
        .build();
    let client = Client::new(config);
    let id = id("obj");
    let body = Bytes::from(vec![7u8; 4096]);
    client.put_object(&id, body.clone()).await.unwrap();

    let merged = client
        .add_object_metadata(&id, map(&[("status", "ok"), ("count", "1")]))
        .await
        .unwrap();
    assert_eq!(map(&[("status", "ok"), ("count", "1")]), merged);
    assert_eq!(Some(2), client.inc_metadata(&id, "count").await.unwrap());

    assert_eq!(body, client.get_object(&id).await.unwrap());
    assert_eq!(
        map(&[("status", "ok"), ("count", "2")]),
        client.get_metadata(&id).await.unwrap()
    );
}

#[tokio::test]
async fn test_counters() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);
    let id = id("obj");
    client.put_object(&id, "hello").await.unwrap();
    client
        .add_object_metadata(&id, map(&[("count", "5")]))
        .await
        .unwrap();

    assert_eq!(None, client.inc_metadata(&id, "missing").await.unwrap());
    assert_eq!(map(&[("count", "5")]), client.get_metadata(&id).await.unwrap());

    assert_eq!(Some(6), client.inc_metadata(&id, "count").await.unwrap());
    assert_eq!(map(&[("count", "6")]), client.get_metadata(&id).await.unwrap());

    assert_eq!(Some(5), client.dec_metadata(&id, "count").await.unwrap());
    assert_eq!(map(&[("count", "5")]), client.get_metadata(&id).await.unwrap());
}

#[tokio::test]
async fn test_counter_not_an_integer() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);
    let id = id("obj");
    client.put_object(&id, "hello").await.unwrap();
    client
        .add_object_metadata(&id, map(&[("count", "many")]))
        .await
        .unwrap();

    let err = client.inc_metadata(&id, "count").await.unwrap_err();
    assert_eq!(&ErrorKind::InvalidMetadata, err.kind());
    assert_eq!(map(&[("count", "many")]), client.get_metadata(&id).await.unwrap());
}

#[tokio::test]
async fn test_tags_merge() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);

    assert!(client.get_tags(ACCOUNT, "never-tagged").await.unwrap().is_empty());

    let returned = client
        .add_tags(ACCOUNT, CONTAINER, map(&[("x", "1")]))
        .await
        .unwrap();
    assert_eq!(map(&[("x", "1")]), returned);

    let returned = client
        .add_tags(ACCOUNT, CONTAINER, map(&[("y", "2")]))
        .await
        .unwrap();
    assert_eq!(map(&[("y", "2")]), returned);

    assert_eq!(
        map(&[("x", "1"), ("y", "2")]),
        client.get_tags(ACCOUNT, CONTAINER).await.unwrap()
    );
    assert_eq!(Some(Bytes::new()), store.body(CONTAINER, "tags"));

    client
        .add_tags(ACCOUNT, CONTAINER, map(&[("x", "3")]))
        .await
        .unwrap();
    assert_eq!(
        Some(map(&[("x", "3"), ("y", "2")])),
        store.tags(CONTAINER, "tags")
    );
}

#[tokio::test]
async fn test_tags_account_as_bucket() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::AccountAsBucket);

    client
        .add_tags(ACCOUNT, CONTAINER, map(&[("x", "1")]))
        .await
        .unwrap();
    assert_eq!(vec!["cont/tags".to_owned()], store.keys(ACCOUNT));
    assert_eq!(
        map(&[("x", "1")]),
        client.get_tags(ACCOUNT, CONTAINER).await.unwrap()
    );
    assert!(client.get_tags(ACCOUNT, "other").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_normalizes_across_modes() {
    let mut listings = Vec::new();
    for mode in [AddressingMode::ContainerAsBucket, AddressingMode::AccountAsBucket] {
        let store = InMemoryStore::new();
        let client = client(&store, mode);
        client.put_object(&id("obj"), "1").await.unwrap();
        client
            .put_object(&ObjectIdentity::new(ACCOUNT, CONTAINER, "obj2").with_source("src"), "2")
            .await
            .unwrap();
        client
            .put_object(&ObjectIdentity::new(ACCOUNT, CONTAINER, "obj3"), "3")
            .await
            .unwrap();
        client
            .add_tags(ACCOUNT, CONTAINER, map(&[("x", "1")]))
            .await
            .unwrap();

        let objects = client
            .get_all_objects(ACCOUNT, CONTAINER)
            .await
            .unwrap()
            .expect("objects found");
        assert!(objects.iter().all(|o| o.last_modified().is_some()));
        listings.push(paths(&objects));
    }

    let expected = vec![
        (None, None, "obj3".to_owned()),
        (Some("src".to_owned()), None, "obj2".to_owned()),
        (Some("src".to_owned()), Some("proc".to_owned()), "obj".to_owned()),
    ];
    assert_eq!(expected, listings[0]);
    assert_eq!(listings[0], listings[1]);
}

#[tokio::test]
async fn test_list_scoped_to_container() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::AccountAsBucket);
    client.put_object(&id("obj"), "1").await.unwrap();
    client
        .put_object(&ObjectIdentity::new(ACCOUNT, "other", "elsewhere"), "2")
        .await
        .unwrap();

    let objects = client.get_all_objects(ACCOUNT, CONTAINER).await.unwrap().unwrap();
    assert_eq!(1, objects.len());
    assert_eq!("obj", objects[0].object_name());
}

#[tokio::test]
async fn test_list_empty_and_filtered() {
    let store = InMemoryStore::new().with_bucket(CONTAINER);
    let client = client(&store, AddressingMode::ContainerAsBucket);
    assert_eq!(None, client.get_all_objects(ACCOUNT, CONTAINER).await.unwrap());

    // keys exist but none decode
    client
        .add_tags(ACCOUNT, CONTAINER, map(&[("x", "1")]))
        .await
        .unwrap();
    store.insert(CONTAINER, "a/b/c/d", "deep", HashMap::new());
    assert_eq!(
        Some(Vec::new()),
        client.get_all_objects(ACCOUNT, CONTAINER).await.unwrap()
    );
}

#[tokio::test]
async fn test_unsupported_operations() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);

    let outcome = client
        .remove_container(ACCOUNT, CONTAINER, Some("src"), None)
        .await;
    assert_eq!(Outcome::Unsupported, outcome);
    assert!(!outcome.is_completed());
    assert_eq!(
        Outcome::Unsupported,
        client.pack(ACCOUNT, CONTAINER, None, None).await
    );
    assert_eq!(ConnectionState::Unset, client.connection_state());
}

#[tokio::test]
async fn test_unreachable_store() {
    let store = InMemoryStore::new();
    let client = client(&store, AddressingMode::ContainerAsBucket);
    client.put_object(&id("obj"), "hello").await.unwrap();
    assert_eq!(ConnectionState::Valid, client.connection_state());

    store.set_offline(true);
    let err = client.get_object(&id("obj")).await.unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());
    assert_eq!(ConnectionState::Invalid, client.connection_state());
    let err = client.get_tags(ACCOUNT, CONTAINER).await.unwrap_err();
    assert_eq!(&ErrorKind::ObjectStoreUnavailable, err.kind());

    store.set_offline(false);
    assert_eq!(Bytes::from_static(b"hello"), client.get_object(&id("obj")).await.unwrap());
}
