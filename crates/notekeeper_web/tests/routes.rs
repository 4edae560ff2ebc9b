use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use notekeeper_core::db::open_db_in_memory;
use notekeeper_core::{Identity, Note, NoteDraft, UserId, UserRepository};
use notekeeper_web::config::SessionSettings;
use notekeeper_web::{router, AppState, Credentials};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tower::ServiceExt;

const PASSWORD: &str = "s3cret-pass";

struct TestApp {
    router: Router,
    state: AppState,
}

fn test_app() -> TestApp {
    let conn = open_db_in_memory().unwrap();
    let state = AppState::new(conn, Credentials::new(8, 1).unwrap());
    let sessions = SessionSettings {
        secure_cookie: false,
        idle_timeout_minutes: 60,
    };
    TestApp {
        router: router(state.clone(), &sessions),
        state,
    }
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&")
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form_body(fields))).unwrap())
            .await
    }

    async fn create_user(&self, username: &str) -> UserId {
        let hash = self.state.credentials().hash_password(PASSWORD).unwrap();
        self.state
            .with_users(|users| users.create_user(username, &hash))
            .await
            .unwrap()
            .id
    }

    async fn login(&self, username: &str) -> String {
        let response = self
            .post_form(
                "/auth/login/",
                &[("username", username), ("password", PASSWORD)],
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }

    async fn seed_note(&self, author_id: UserId, title: &str, slug: &str) -> Note {
        self.state
            .with_notes(|notes| {
                notes.create_note(
                    Identity::User(author_id),
                    &NoteDraft::new(title, "Text").with_slug(slug),
                )
            })
            .await
            .unwrap()
    }

    async fn add_note(&self, cookie: &str, title: &str, slug: &str) -> Response {
        self.post_form(
            "/add/",
            &[("title", title), ("text", "Note text"), ("slug", slug)],
            Some(cookie),
        )
        .await
    }
}

#[tokio::test]
async fn public_pages_are_open_to_anonymous_callers() {
    let app = test_app();
    for path in ["/", "/auth/login/", "/auth/signup/"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn anonymous_callers_are_sent_to_login_with_next() {
    let app = test_app();
    let author = app.create_user("author").await;
    let note = app.seed_note(author, "Заголовок", "zagolovok").await;

    let urls = [
        "/add/".to_string(),
        "/notes/".to_string(),
        "/done/".to_string(),
        format!("/note/{}/", note.slug),
        format!("/edit/{}/", note.slug),
        format!("/delete/{}/", note.slug),
    ];
    for url in &urls {
        let response = app.get(url, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{url}");
        assert_eq!(location(&response), format!("/auth/login/?next={url}"));
    }

    let missing = app.get("/note/no-such-note/", None).await;
    assert_eq!(location(&missing), "/auth/login/?next=/note/no-such-note/");
}

#[tokio::test]
async fn anonymous_writes_are_redirected_and_change_nothing() {
    let app = test_app();
    let author = app.create_user("author").await;
    let note = app.seed_note(author, "Keep me", "keep-me").await;

    let create = app
        .post_form("/add/", &[("title", "Sneaky"), ("text", "x"), ("slug", "")], None)
        .await;
    assert_eq!(create.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&create), "/auth/login/?next=/add/");

    let delete = app.post_form(&format!("/delete/{}/", note.slug), &[], None).await;
    assert_eq!(delete.status(), StatusCode::SEE_OTHER);

    let cookie = app.login("author").await;
    let list = body_text(app.get("/notes/", Some(&cookie)).await).await;
    assert!(list.contains("Keep me"));
    assert!(!list.contains("Sneaky"));
}

#[tokio::test]
async fn author_gets_every_note_page() {
    let app = test_app();
    let author = app.create_user("author").await;
    let note = app.seed_note(author, "Mine", "mine").await;
    let cookie = app.login("author").await;

    for url in [
        "/".to_string(),
        "/notes/".to_string(),
        "/add/".to_string(),
        "/done/".to_string(),
        format!("/note/{}/", note.slug),
        format!("/edit/{}/", note.slug),
        format!("/delete/{}/", note.slug),
    ] {
        let response = app.get(&url, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{url}");
    }
}

#[tokio::test]
async fn other_users_get_not_found_for_foreign_notes() {
    let app = test_app();
    let author = app.create_user("author").await;
    app.create_user("reader").await;
    let note = app.seed_note(author, "Private", "private").await;
    let reader = app.login("reader").await;

    for url in ["/note/private/", "/edit/private/", "/delete/private/"] {
        let response = app.get(url, Some(&reader)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{url}");
    }

    let edit = app
        .post_form(
            "/edit/private/",
            &[("title", "Hijacked"), ("text", "x"), ("slug", "private")],
            Some(&reader),
        )
        .await;
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);
    let delete = app.post_form("/delete/private/", &[], Some(&reader)).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let author_cookie = app.login("author").await;
    let detail = app.get(&format!("/note/{}/", note.slug), Some(&author_cookie)).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(body_text(detail).await.contains("Private"));
}

#[tokio::test]
async fn hidden_note_and_missing_note_look_the_same() {
    let app = test_app();
    let author = app.create_user("author").await;
    app.create_user("reader").await;
    app.seed_note(author, "Private", "private").await;
    let reader = app.login("reader").await;

    let hidden = app.get("/note/private/", Some(&reader)).await;
    let missing = app.get("/note/never-existed/", Some(&reader)).await;
    assert_eq!(hidden.status(), missing.status());
    assert_eq!(body_text(hidden).await, body_text(missing).await);
}

#[tokio::test]
async fn creating_without_slug_derives_one_from_the_title() {
    let app = test_app();
    app.create_user("author").await;
    let cookie = app.login("author").await;

    let response = app.add_note(&cookie, "Моя первая заметка", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/done/");

    let detail = app.get("/note/moya-pervaya-zametka/", Some(&cookie)).await;
    assert_eq!(detail.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_slug_from_another_user_is_a_form_error() {
    let app = test_app();
    app.create_user("alice").await;
    app.create_user("bob").await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let first = app.add_note(&alice, "Alice note", "user-note-1").await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app.add_note(&bob, "Bob note", "user-note-1").await;
    assert_eq!(second.status(), StatusCode::OK);
    let page = body_text(second).await;
    assert!(page.contains("user-note-1 - this slug already exists, choose a unique value!"));
    assert!(page.contains("value=\"Bob note\""));

    let bob_list = body_text(app.get("/notes/", Some(&bob)).await).await;
    assert!(!bob_list.contains("user-note-1"));
    let alice_detail = body_text(app.get("/note/user-note-1/", Some(&alice)).await).await;
    assert!(alice_detail.contains("Alice note"));
}

#[tokio::test]
async fn invalid_form_is_rerendered_with_field_errors() {
    let app = test_app();
    app.create_user("author").await;
    let cookie = app.login("author").await;

    let response = app
        .post_form(
            "/add/",
            &[("title", ""), ("text", ""), ("slug", "bad slug")],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    for field in ["title", "text", "slug"] {
        assert!(page.contains(&format!("id=\"{field}-errors\"")), "{field}");
    }
}

#[tokio::test]
async fn list_shows_only_own_notes_in_creation_order() {
    let app = test_app();
    app.create_user("author").await;
    app.create_user("other").await;
    let author = app.login("author").await;
    let other = app.login("other").await;

    for title in ["First", "Second", "Third"] {
        let response = app.add_note(&author, title, "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    app.add_note(&other, "Foreign", "").await;

    let page = body_text(app.get("/notes/", Some(&author)).await).await;
    let positions: Vec<usize> = ["First", "Second", "Third"]
        .iter()
        .map(|title| page.find(title).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!page.contains("Foreign"));
}

#[tokio::test]
async fn author_can_edit_and_delete() {
    let app = test_app();
    app.create_user("author").await;
    let cookie = app.login("author").await;
    app.add_note(&cookie, "Draft", "draft").await;

    let edit = app
        .post_form(
            "/edit/draft/",
            &[("title", "Final"), ("text", "Done"), ("slug", "final")],
            Some(&cookie),
        )
        .await;
    assert_eq!(edit.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&edit), "/done/");
    assert_eq!(app.get("/note/draft/", Some(&cookie)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/note/final/", Some(&cookie)).await.status(), StatusCode::OK);

    let delete = app.post_form("/delete/final/", &[], Some(&cookie)).await;
    assert_eq!(delete.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&delete), "/done/");
    assert_eq!(app.get("/note/final/", Some(&cookie)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_honours_local_next_and_logout_ends_the_session() {
    let app = test_app();
    app.create_user("author").await;

    let login = app
        .post_form(
            "/auth/login/",
            &[("username", "author"), ("password", PASSWORD), ("next", "/notes/")],
            None,
        )
        .await;
    assert_eq!(location(&login), "/notes/");
    let cookie = session_cookie(&login);

    let external = app
        .post_form(
            "/auth/login/",
            &[("username", "author"), ("password", PASSWORD), ("next", "https://evil.example/")],
            None,
        )
        .await;
    assert_eq!(location(&external), "/");

    let logout = app.post_form("/auth/logout/", &[], Some(&cookie)).await;
    assert_eq!(logout.status(), StatusCode::OK);
    let after = app.get("/notes/", Some(&cookie)).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_never_redirects_off_site_through_next() {
    let app = test_app();
    app.create_user("author").await;

    for next in [
        "/\t/evil.example/",
        "/\n/evil.example/",
        "//evil.example/",
        "/\\evil.example/",
    ] {
        let response = app
            .post_form(
                "/auth/login/",
                &[("username", "author"), ("password", PASSWORD), ("next", next)],
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{next:?}");
        assert_eq!(location(&response), "/", "{next:?}");
    }
}

#[tokio::test]
async fn unknown_username_is_rejected_like_a_wrong_password() {
    let app = test_app();
    app.create_user("author").await;

    let unknown = app
        .post_form(
            "/auth/login/",
            &[("username", "nobody"), ("password", PASSWORD)],
            None,
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::OK);
    assert!(body_text(unknown)
        .await
        .contains("Please enter a correct username and password."));
}

#[tokio::test]
async fn wrong_password_rerenders_login() {
    let app = test_app();
    app.create_user("author").await;

    let response = app
        .post_form(
            "/auth/login/",
            &[("username", "author"), ("password", "not-the-password")],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Please enter a correct username and password."));
}

#[tokio::test]
async fn signup_then_login() {
    let app = test_app();
    let fields = [
        ("username", "newcomer"),
        ("password1", "long enough pass"),
        ("password2", "long enough pass"),
    ];

    let signup = app.post_form("/auth/signup/", &fields, None).await;
    assert_eq!(signup.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&signup), "/auth/login/");

    let again = app.post_form("/auth/signup/", &fields, None).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(body_text(again)
        .await
        .contains("A user with that username already exists."));

    let login = app
        .post_form(
            "/auth/login/",
            &[("username", "newcomer"), ("password", "long enough pass")],
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), "/");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = test_app();
    let response = app.get("/no/such/page/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
