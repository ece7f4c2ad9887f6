use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use reqwest::Client;
use std::sync::{Arc, Mutex};
use stream_resolver::{
    StreamDescriptor,
    download::{default_file_name, download},
    extractor::{probe, retain_reachable},
};
use tokio::net::TcpListener;

const BODY: &[u8] = b"not really an mp4 but long enough";

async fn guarded(headers: HeaderMap) -> impl IntoResponse {
    match headers.get(header::REFERER).and_then(|v| v.to_str().ok()) {
        Some("https://site.example/watch?file=a") => (StatusCode::OK, BODY).into_response(),
        _ => StatusCode::FORBIDDEN.into_response(),
    }
}

async fn start() -> String {
    let router = Router::new()
        .route("/ep.mp4", get(guarded))
        .route(
            "/nohead.mp4",
            get(|| async { BODY }).head(|| async { StatusCode::METHOD_NOT_ALLOWED }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let authority = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{authority}")
}

fn descriptor(url: String) -> StreamDescriptor {
    StreamDescriptor::builder(url, "Direct MP4")
        .referer("https://site.example/watch?file=a")
        .user_agent("TestAgent/1.0")
        .build()
}

#[tokio::test]
async fn probe_replays_headers_and_falls_back_to_get() {
    let base = start().await;
    let client = Client::new();

    assert!(probe(&client, &descriptor(format!("{base}/ep.mp4"))).await);
    assert!(probe(&client, &descriptor(format!("{base}/nohead.mp4"))).await);
    assert!(!probe(&client, &descriptor(format!("{base}/missing.mp4"))).await);

    let headerless = StreamDescriptor::builder(format!("{base}/ep.mp4"), "Direct MP4").build();
    assert!(!probe(&client, &headerless).await);

    let kept = retain_reachable(
        &client,
        vec![
            descriptor(format!("{base}/missing.mp4")),
            descriptor(format!("{base}/ep.mp4")),
        ],
    )
    .await;
    assert_eq!(kept.len(), 1);
    assert!(kept[0].url.ends_with("/ep.mp4"));
}

#[tokio::test]
async fn download_writes_body_and_reports_progress() {
    let base = start().await;
    let dir = tempfile::tempdir().unwrap();
    let stream = descriptor(format!("{base}/ep.mp4"));
    let path = dir.path().join(default_file_name(&stream));

    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let written = download(&Client::new(), &stream, &path, move |done, total| {
        seen.lock().unwrap().push((done, total));
    })
    .await
    .unwrap();

    assert_eq!(written, BODY.len() as u64);
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.last().copied(), Some((BODY.len() as u64, Some(BODY.len() as u64))));
}
