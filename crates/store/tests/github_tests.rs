use gallery_store::backend::GitHubBackend;
use gallery_store::error::ErrorKind;
use gallery_store::{ContentStore, Credential, Lookup, Repository, Token, WriteRequest};
use httpmock::Method::{GET, PUT};
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;

const TOKEN: &str = "ghp_test";
const CONTENTS: &str = "/repos/cookiesquad/site/contents";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn setup(server: &MockServer) -> (GitHubBackend, Credential, Repository) {
    let backend = GitHubBackend::new("github", server.base_url()).unwrap();
    (backend, Credential::new(TOKEN), "cookiesquad/site".parse().unwrap())
}

#[tokio::test]
async fn read_found() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("{CONTENTS}/assets/photos/spring/manifest.json"))
            .query_param("ref", "main")
            .header("authorization", format!("Bearer {TOKEN}"))
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28");
        then.status(200).json_body(json!({
            "type": "file",
            "path": "assets/photos/spring/manifest.json",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "content": "eyJwaG90b3MiOltdfQo=\n",
            "encoding": "base64"
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let lookup = backend
        .read(&credential, &repository, "assets/photos/spring/manifest.json", "main")
        .await
        .unwrap();

    mock.assert();
    let Lookup::Found(object) = lookup else {
        panic!("expected object, got {lookup:?}");
    };
    assert_eq!(object.path, "assets/photos/spring/manifest.json");
    assert_eq!(object.content, "eyJwaG90b3MiOltdfQo=\n");
    assert_eq!(object.token, Token::new("3d21ec53a331a6f037a91c368710b99387d012c1"));
}

#[tokio::test]
async fn read_not_found_is_not_an_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{CONTENTS}/assets/photos/new/manifest.json"));
        then.status(404).json_body(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/repos/contents#get-repository-content"
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let lookup = backend
        .read(&credential, &repository, "assets/photos/new/manifest.json", "gh-pages")
        .await
        .unwrap();
    assert_eq!(lookup, Lookup::NotFound);
}

#[tokio::test]
async fn read_unauthorized_reports_status() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{CONTENTS}/a.json"));
        then.status(401).json_body(json!({ "message": "Bad credentials" }));
    });

    let (backend, credential, repository) = setup(&server);
    let err = backend.read(&credential, &repository, "a.json", "main").await.unwrap_err();
    assert_eq!(
        *err,
        ErrorKind::Status {
            status: 401,
            message: "Bad credentials".into()
        }
    );
}

#[tokio::test]
async fn create_omits_sha() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{CONTENTS}/assets/photos/spring/1_1_abc.jpg"))
            .header("authorization", format!("Bearer {TOKEN}"))
            .json_body(json!({
                "message": "Upload photo for spring",
                "content": "/9j/4AAQ",
                "branch": "main"
            }));
        then.status(201).json_body(json!({
            "content": { "path": "assets/photos/spring/1_1_abc.jpg", "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3" },
            "commit": { "sha": "7638417db6d59f3c431d3e1f261cc637155684cd" }
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let request = WriteRequest::create("assets/photos/spring/1_1_abc.jpg", "main", "/9j/4AAQ", "Upload photo for spring");
    let committed = backend.write(&credential, &repository, request).await.unwrap();

    mock.assert();
    assert_eq!(committed.path, "assets/photos/spring/1_1_abc.jpg");
    assert_eq!(committed.token, Some(Token::new("95b966ae1c166bd92f8ae7d1c313e738c731dfc3")));
}

#[tokio::test]
async fn update_sends_sha() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{CONTENTS}/assets/photos/spring/manifest.json"))
            .json_body(json!({
                "message": "Update photo manifest for spring",
                "content": "e30K",
                "branch": "main",
                "sha": "old-sha"
            }));
        then.status(200).json_body(json!({
            "content": { "path": "assets/photos/spring/manifest.json", "sha": "new-sha" }
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let request = WriteRequest::create(
        "assets/photos/spring/manifest.json",
        "main",
        "e30K",
        "Update photo manifest for spring",
    )
    .expecting(Token::new("old-sha"));
    let committed = backend.write(&credential, &repository, request).await.unwrap();

    mock.assert();
    assert_eq!(committed.token, Some(Token::new("new-sha")));
}

#[tokio::test]
async fn stale_sha_is_a_conflict() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path(format!("{CONTENTS}/m.json"));
        then.status(409).json_body(json!({
            "message": "m.json does not match old-sha",
            "documentation_url": "https://docs.github.com/rest/repos/contents#create-or-update-file-contents"
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let request = WriteRequest::create("m.json", "main", "e30K", "msg").expecting(Token::new("old-sha"));
    let err = backend.write(&credential, &repository, request).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn missing_sha_is_a_conflict() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path(format!("{CONTENTS}/m.json"));
        then.status(422).json_body(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let request = WriteRequest::create("m.json", "main", "e30K", "msg");
    let err = backend.write(&credential, &repository, request).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn server_error_is_retryable_status() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path(format!("{CONTENTS}/p.jpg"));
        then.status(502).body("upstream unavailable");
    });

    let (backend, credential, repository) = setup(&server);
    let request = WriteRequest::create("p.jpg", "main", "Zm9v", "msg");
    let err = backend.write(&credential, &repository, request).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert!(!err.is_conflict());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_response_is_invalid() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{CONTENTS}/a.json"));
        then.status(200).body("<html>not json</html>");
    });

    let (backend, credential, repository) = setup(&server);
    let err = backend.read(&credential, &repository, "a.json", "main").await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
}

#[tokio::test]
async fn oversized_file_is_invalid_not_empty() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    // Files over 1 MB come back with their content left out.
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{CONTENTS}/assets/photos/spring/manifest.json"));
        then.status(200).json_body(json!({
            "type": "file",
            "path": "assets/photos/spring/manifest.json",
            "sha": "abc",
            "content": "",
            "encoding": "none"
        }));
    });

    let (backend, credential, repository) = setup(&server);
    let err = backend
        .read(&credential, &repository, "assets/photos/spring/manifest.json", "main")
        .await
        .unwrap_err();
    assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
    assert!(!err.is_conflict());
}

#[tokio::test]
async fn api_url_with_prefix() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(format!("/api/v3{CONTENTS}/a.json"));
        then.status(404);
    });

    let backend = GitHubBackend::new("enterprise", format!("{}/api/v3/", server.base_url())).unwrap();
    let repository: Repository = "cookiesquad/site".parse().unwrap();
    let lookup = backend.read(&Credential::new(TOKEN), &repository, "a.json", "main").await.unwrap();

    mock.assert();
    assert_eq!(lookup, Lookup::NotFound);
}
