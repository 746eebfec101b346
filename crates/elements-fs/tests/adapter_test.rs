mod common;

use chrono::DateTime;
use common::{adapter, adapter_with, children, lookup, MockHttp};
use elements_api::{DownloadKey, ElementsClient, Endpoints};
use elements_fs::{
    DirectoryAttributes, ElementsAdapter, Error, FileAttributes, MetadataKind, Operation, Reason,
    RootStrategy, StorageAttributes, Visibility,
};
use std::io::{Cursor, Read};
use std::sync::{Arc, Barrier};
use std::thread;

const FILE_JPG: &str = r#"[{"id":5,"is_dir":false,"mtime":123,"size":456,"path":"my/path.jpg"}]"#;
const DIR_MY: &str = r#"[{"id":321,"is_dir":true,"mtime":123,"path":"my"}]"#;

fn paths(listed: &[StorageAttributes]) -> Vec<&str> {
    listed.iter().map(StorageAttributes::path).collect()
}

#[test]
fn metadata_is_fetched_once_per_path() {
    let http = MockHttp::new();
    http.respond(&lookup("my/path.jpg"), FILE_JPG);
    let adapter = adapter(&http);

    adapter.file_size("my/path.jpg").unwrap();
    adapter.mime_type("my/path.jpg").unwrap();
    adapter.file_exists("my/path.jpg").unwrap();

    assert_eq!(http.requests(), vec![lookup("my/path.jpg")]);
}

#[test]
fn file_metadata_maps_all_attributes() {
    let http = MockHttp::new();
    http.respond(&lookup("my/path.jpg"), FILE_JPG);
    let adapter = adapter(&http);

    let attrs = adapter.metadata("my/path.jpg", MetadataKind::MimeType).unwrap();
    assert_eq!(
        attrs,
        FileAttributes {
            path: "my/path.jpg".to_string(),
            size: 456,
            visibility: Visibility::Public,
            modified_at: DateTime::from_timestamp(123, 0),
            mime_type: Some("image/jpeg".to_string()),
        }
    );
}

#[test]
fn unknown_extension_has_no_mime_type() {
    let http = MockHttp::new();
    http.respond(
        &lookup("my/path"),
        r#"[{"id":5,"is_dir":false,"mtime":123,"size":456,"path":"my/path"}]"#,
    );
    let adapter = adapter(&http);

    let attrs = adapter.mime_type("my/path").unwrap();
    assert_eq!(attrs.mime_type, None);
}

#[test]
fn metadata_of_directory_is_not_a_file() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    let adapter = adapter(&http);

    let err = adapter.file_size("my").unwrap_err();
    assert!(matches!(
        err,
        Error::RetrieveMetadata {
            kind: MetadataKind::FileSize,
            reason: Reason::NotAFile,
            ..
        }
    ));
}

#[test]
fn metadata_of_missing_path_is_not_found() {
    let http = MockHttp::new();
    http.respond(&lookup("nope.jpg"), "[]");
    let adapter = adapter(&http);

    let err = adapter.last_modified("nope.jpg").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn existence_checks_on_empty_response() {
    let http = MockHttp::new();
    http.respond(&lookup("file-one"), "[]");
    let adapter = adapter(&http);

    assert!(!adapter.exists("file-one").unwrap());
    assert!(!adapter.file_exists("file-one").unwrap());
    assert!(!adapter.is_directory("file-one").unwrap());
    assert_eq!(http.request_count(), 1);
}

#[test]
fn existence_checks_distinguish_kinds() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(&lookup("my/path.jpg"), FILE_JPG);
    let adapter = adapter(&http);

    assert!(adapter.exists("my").unwrap());
    assert!(adapter.directory_exists("my").unwrap());
    assert!(!adapter.file_exists("my").unwrap());
    assert!(adapter.file_exists("my/path.jpg").unwrap());
    assert!(!adapter.directory_exists("my/path.jpg").unwrap());
}

#[test]
fn read_returns_download_body() {
    let http = MockHttp::new();
    http.respond(
        &lookup("my/path"),
        r#"[{"id":321,"is_dir":false,"mtime":123,"size":11,"path":"my/path"}]"#,
    );
    http.respond("api/2/media/files/321/download", "hello world");
    let adapter = adapter(&http);

    assert_eq!(adapter.read("my/path").unwrap(), b"hello world".to_vec());
    assert_eq!(
        http.requests(),
        vec![lookup("my/path"), "api/2/media/files/321/download".to_string()]
    );
}

#[test]
fn read_stream_returns_download_body() {
    let http = MockHttp::new();
    http.respond(
        &lookup("my/path"),
        r#"[{"id":321,"is_dir":false,"size":11,"path":"my/path"}]"#,
    );
    http.respond("api/2/media/files/321/download", "hello world");
    let adapter = adapter(&http);

    let mut contents = String::new();
    adapter
        .read_stream("my/path")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "hello world");
}

#[test]
fn read_of_directory_fails_without_download() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    let adapter = adapter(&http);

    let err = adapter.read("my").unwrap_err();
    assert!(matches!(
        err,
        Error::Read {
            reason: Reason::NotAFile,
            ..
        }
    ));
    assert!(adapter.read_stream("my").is_err());
    assert_eq!(http.request_count(), 1);
}

#[test]
fn read_of_missing_file_is_not_found() {
    let http = MockHttp::new();
    http.respond(&lookup("nope"), "[]");
    let adapter = adapter(&http);

    let err = adapter.read("nope").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "unable to read `nope`");
}

#[test]
fn read_uses_bundle_id_on_legacy_deployments() {
    let http = MockHttp::new();
    http.respond(
        &lookup("my/path"),
        r#"[{"bundle":321,"is_dir":false,"mtime":123,"size":456,"path":"my/path"}]"#,
    );
    http.respond("api/media/download/321", "hello world");
    let client = ElementsClient::new(http.clone())
        .with_endpoints(Endpoints::legacy())
        .with_download_key(DownloadKey::Bundle);
    let adapter = ElementsAdapter::new(client);

    assert_eq!(adapter.read("my/path").unwrap(), b"hello world".to_vec());
}

#[test]
fn listing_resolves_parent_then_children() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(
        &children(321),
        r#"[{"id":6,"is_dir":false,"mtime":123,"size":456,"path":"my/path"}]"#,
    );
    let adapter = adapter(&http);

    let listed = adapter.list_contents("my", false).unwrap();
    assert_eq!(
        listed,
        vec![StorageAttributes::File(FileAttributes {
            path: "my/path".to_string(),
            size: 456,
            visibility: Visibility::Public,
            modified_at: DateTime::from_timestamp(123, 0),
            mime_type: None,
        })]
    );
    assert_eq!(http.requests(), vec![lookup("my"), children(321)]);
}

#[test]
fn listing_is_cached_and_warms_children() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(
        &children(321),
        r#"[{"id":6,"is_dir":false,"size":11,"path":"my/b.txt"},
            {"id":7,"is_dir":true,"path":"my/a"}]"#,
    );
    http.respond("api/2/media/files/6/download", "hello world");
    let adapter = adapter(&http);

    let first = adapter.list_contents("my", false).unwrap();
    let second = adapter.list_contents("my", false).unwrap();
    assert_eq!(first, second);
    assert_eq!(paths(&first), vec!["my/b.txt", "my/a"]);

    assert!(adapter.file_exists("my/b.txt").unwrap());
    assert!(adapter.directory_exists("my/a").unwrap());
    assert_eq!(adapter.file_size("my/b.txt").unwrap().size, 11);
    assert_eq!(http.request_count(), 2);

    adapter.read("my/b.txt").unwrap();
    assert_eq!(http.request_count(), 3);
}

#[test]
fn listing_missing_directory_is_empty() {
    let http = MockHttp::new();
    http.respond(&lookup("gone"), "[]");
    let adapter = adapter(&http);

    assert!(adapter.list_contents("gone", false).unwrap().is_empty());
    assert!(adapter.list_contents("gone", true).unwrap().is_empty());
    assert_eq!(http.request_count(), 1);
}

#[test]
fn listing_empty_roots_is_empty() {
    let http = MockHttp::new();
    http.respond("api/2/media/roots", "[]");
    let adapter = adapter(&http);

    assert!(adapter.list_contents("", false).unwrap().is_empty());
}

#[test]
fn listing_roots_yields_synthetic_directories() {
    let http = MockHttp::new();
    http.respond("api/2/media/roots", r#"[{"path":"projects"},{"path":"archive"}]"#);
    let adapter = adapter(&http);

    let listed = adapter.list_contents("/", false).unwrap();
    assert_eq!(
        listed[0],
        StorageAttributes::Directory(DirectoryAttributes {
            path: "projects".to_string(),
            visibility: Visibility::Public,
            modified_at: None,
        })
    );
    assert_eq!(paths(&listed), vec!["projects", "archive"]);

    assert!(adapter.directory_exists("archive").unwrap());
    assert_eq!(http.request_count(), 1);
}

#[test]
fn listing_a_root_resolves_its_id_first() {
    let http = MockHttp::new();
    http.respond("api/2/media/roots", r#"[{"path":"projects"}]"#);
    http.respond(
        &lookup("projects"),
        r#"[{"id":9,"is_dir":true,"path":"projects"}]"#,
    );
    http.respond(
        &children(9),
        r#"[{"id":10,"is_dir":false,"size":1,"path":"projects/a.png"}]"#,
    );
    let adapter = adapter(&http);

    adapter.list_contents("", false).unwrap();
    let listed = adapter.list_contents("projects", false).unwrap();
    assert_eq!(paths(&listed), vec!["projects/a.png"]);
    assert_eq!(
        http.requests(),
        vec![
            "api/2/media/roots".to_string(),
            lookup("projects"),
            children(9)
        ]
    );
}

#[test]
fn deep_listing_walks_directories_pre_order() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(
        &children(321),
        r#"[{"id":7,"is_dir":true,"path":"my/a"},
            {"id":6,"is_dir":false,"size":1,"path":"my/b.txt"}]"#,
    );
    http.respond(
        &children(7),
        r#"[{"id":8,"is_dir":false,"size":2,"path":"my/a/c.jpg"}]"#,
    );
    let adapter = adapter(&http);

    let listed = adapter.list_contents("my", true).unwrap();
    assert_eq!(paths(&listed), vec!["my/a", "my/a/c.jpg", "my/b.txt"]);

    let shallow = adapter.list_contents("my", false).unwrap();
    assert_eq!(paths(&shallow), vec!["my/a", "my/b.txt"]);
    assert_eq!(http.request_count(), 3);
}

#[test]
fn permission_scoped_roots_strip_volume_paths() {
    let http = MockHttp::new();
    http.respond(
        "api/2/volumes",
        r#"[{"path":"/mnt/vol"},{"path":"/mnt/vol/archive/"}]"#,
    );
    http.respond(
        "api/2/media/roots/permissions",
        r#"[{"fullPath":"/mnt/vol/archive/2020"},{"fullPath":"/mnt/vol/live"}]"#,
    );
    let adapter = adapter_with(&http, "", RootStrategy::PermissionScoped);

    let listed = adapter.list_contents("", false).unwrap();
    assert_eq!(paths(&listed), vec!["2020", "live"]);
    assert!(listed.iter().all(StorageAttributes::is_dir));

    adapter.list_contents("", false).unwrap();
    assert_eq!(http.request_count(), 2);
}

#[test]
fn permission_on_whole_volume_is_not_listed_as_a_root() {
    let http = MockHttp::new();
    http.respond("api/2/volumes", r#"[{"path":"/mnt/vol"}]"#);
    http.respond(
        "api/2/media/roots/permissions",
        r#"[{"fullPath":"/mnt/vol"},{"fullPath":"/mnt/vol/live"}]"#,
    );
    http.respond(&lookup("live"), r#"[{"id":3,"is_dir":true,"path":"live"}]"#);
    http.respond(&children(3), "[]");
    let adapter = adapter_with(&http, "", RootStrategy::PermissionScoped);

    let listed = adapter.list_contents("", true).unwrap();
    assert_eq!(paths(&listed), vec!["live"]);
    assert_eq!(
        http.requests(),
        vec![
            "api/2/volumes".to_string(),
            "api/2/media/roots/permissions".to_string(),
            lookup("live"),
            children(3)
        ]
    );
}

#[test]
fn deep_listing_stops_at_directories_listed_under_themselves() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(
        &children(321),
        r#"[{"id":321,"is_dir":true,"path":"my"},
            {"id":7,"is_dir":true,"path":"my/a"}]"#,
    );
    http.respond(
        &children(7),
        r#"[{"id":7,"is_dir":true,"path":"my/a"},
            {"id":321,"is_dir":true,"path":"my"}]"#,
    );
    let adapter = adapter(&http);

    let listed = adapter.list_contents("my", true).unwrap();
    assert_eq!(paths(&listed), vec!["my/a", "my"]);
    assert_eq!(http.request_count(), 3);
}

#[test]
fn listed_root_reports_server_timestamp_after_its_children_are_listed() {
    let http = MockHttp::new();
    http.respond("api/2/media/roots", r#"[{"path":"projects"}]"#);
    http.respond(
        &lookup("projects"),
        r#"[{"id":9,"is_dir":true,"mtime":1700000000,"path":"projects"}]"#,
    );
    http.respond(&children(9), "[]");
    let adapter = adapter(&http);

    adapter.list_contents("", false).unwrap();
    assert_eq!(adapter.stat("projects").unwrap().modified_at(), None);

    adapter.list_contents("projects", false).unwrap();
    let attrs = adapter.stat("projects").unwrap();
    assert!(attrs.is_dir());
    assert_eq!(attrs.modified_at(), DateTime::from_timestamp(1_700_000_000, 0));
    assert_eq!(http.request_count(), 3);
}

#[test]
fn transport_failures_are_reported_and_not_cached() {
    let http = MockHttp::new();
    http.fail(&lookup("my/path.jpg"), 503);
    http.respond(&lookup("my/path.jpg"), FILE_JPG);
    let adapter = adapter(&http);

    let err = adapter.file_exists("my/path.jpg").unwrap_err();
    match &err {
        Error::CheckExistence {
            path,
            reason: Reason::Retrieval(retrieval),
        } => {
            assert_eq!(path, "my/path.jpg");
            assert_eq!(retrieval.path, "my/path.jpg");
            assert!(matches!(
                retrieval.source,
                elements_api::Error::Http { status: 503, .. }
            ));
        }
        other => panic!("unexpected error {:?}", other),
    }

    assert!(adapter.file_exists("my/path.jpg").unwrap());
    assert_eq!(http.request_count(), 2);
}

#[test]
fn listing_failure_names_the_directory() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.fail(&children(321), 500);
    let adapter = adapter(&http);

    let err = adapter.list_contents("my", false).unwrap_err();
    assert!(matches!(err, Error::ListContents { ref path, .. } if path == "my"));
}

#[test]
fn mutating_operations_are_unsupported_without_requests() {
    let http = MockHttp::new();
    let adapter = adapter(&http);

    let results = vec![
        (Operation::Write, adapter.write("a", b"x")),
        (
            Operation::WriteStream,
            adapter.write_stream("a", &mut Cursor::new(b"x".to_vec())),
        ),
        (Operation::Delete, adapter.delete("a")),
        (Operation::DeleteDirectory, adapter.delete_directory("a")),
        (Operation::CreateDirectory, adapter.create_directory("a")),
        (
            Operation::SetVisibility,
            adapter.set_visibility("a", Visibility::Private),
        ),
    ];
    for (expected, result) in results {
        match result.unwrap_err() {
            Error::Unsupported { operation, path } => {
                assert_eq!(operation, expected);
                assert_eq!(path, "a");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    let err = adapter.move_file("a", "b").unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.to_string(), "move is not supported: `a` to `b`");
    assert!(matches!(
        adapter.copy_file("a", "b").unwrap_err(),
        Error::UnsupportedTransfer {
            operation: Operation::Copy,
            ..
        }
    ));

    assert_eq!(http.request_count(), 0);
}

#[test]
fn prefix_is_applied_once_and_stripped_from_listings() {
    let http = MockHttp::new();
    http.respond(
        &lookup("projects/shoot"),
        r#"[{"id":4,"is_dir":true,"path":"projects/shoot"}]"#,
    );
    http.respond(
        &children(4),
        r#"[{"id":5,"is_dir":false,"size":3,"path":"projects/shoot/a.jpg"}]"#,
    );
    let adapter = adapter_with(&http, "projects/", RootStrategy::Direct);

    assert!(adapter.directory_exists("shoot").unwrap());
    let listed = adapter.list_contents("shoot", false).unwrap();
    assert_eq!(paths(&listed), vec!["shoot/a.jpg"]);

    let attrs = adapter.file_size("/shoot/a.jpg").unwrap();
    assert_eq!(attrs.path, "shoot/a.jpg");
    assert_eq!(http.request_count(), 2);
}

#[test]
fn stat_returns_either_kind() {
    let http = MockHttp::new();
    http.respond(&lookup("my"), DIR_MY);
    http.respond(&lookup("missing"), "[]");
    let adapter = adapter(&http);

    assert!(adapter.stat("my").unwrap().is_dir());
    assert!(adapter.stat("missing").unwrap_err().is_not_found());
}

#[test]
fn concurrent_first_lookups_issue_one_request() {
    let http = MockHttp::new();
    http.respond(&lookup("my/path.jpg"), FILE_JPG);
    let adapter = Arc::new(adapter(&http));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                adapter.file_exists("my/path.jpg").unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(http.request_count(), 1);
}
