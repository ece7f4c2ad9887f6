use axum::{
    Router,
    extract::RawQuery,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::{sync::Arc, time::Duration};
use stream_resolver::{DomainConfig, ResolverConfig, StreamDescriptor, StreamResolver};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

const WATCH_PAGE: &str = r#"<html><body>
    <video id="player"><source src="https://cdn.example/ep1.mp4" label="HD"></video>
    <script>var player = { file: "/hls/ep1/master.m3u8" };</script>
    <a href="/watch?file=a&amp;server=2">Server 2</a>
</body></html>"#;

struct Server {
    authority: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Server {
    async fn start() -> Self {
        let router = Router::new().route("/watch", get(watch));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let authority = listener.local_addr().unwrap().to_string();
        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            authority,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

async fn watch(RawQuery(query): RawQuery) -> Response {
    match query.as_deref() {
        Some("file=a") => Html(WATCH_PAGE).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn resolver_for(authorities: &[&str]) -> StreamResolver {
    let config = ResolverConfig::builder()
        .timeout(Duration::from_secs(5))
        .domains(DomainConfig::default().with_service("animesaturn", authorities.iter().copied()))
        .build();
    StreamResolver::from_config(Arc::new(config)).unwrap()
}

async fn resolve_with(authorities: &[&str], watch_url: &str) -> Vec<StreamDescriptor> {
    let resolver = resolver_for(authorities);
    resolver.resolve(watch_url).await
}

#[tokio::test]
async fn mirror_serves_identical_streams() {
    let primary = Server::start().await;
    let primary_authority = primary.authority.clone();
    let watch_url = format!("http://{primary_authority}/watch?file=a");

    let direct = resolve_with(&[primary_authority.as_str()], &watch_url).await;
    assert_eq!(direct.len(), 2);
    assert_eq!(direct[0].url, "https://cdn.example/ep1.mp4");
    assert_eq!(direct[0].quality, "HD");
    assert_eq!(direct[1].url, format!("http://{primary_authority}/hls/ep1/master.m3u8"));
    assert_eq!(direct[1].referer(), Some(watch_url.as_str()));

    primary.stop().await;
    let mirror = Server::start().await;

    let via_mirror = resolve_with(&[primary_authority.as_str(), mirror.authority.as_str()], &watch_url).await;
    assert_eq!(via_mirror, direct);

    mirror.stop().await;
}

#[tokio::test]
async fn every_domain_down_yields_nothing() {
    let gone = Server::start().await;
    let authority = gone.authority.clone();
    gone.stop().await;

    let watch_url = format!("http://{authority}/watch?file=a");
    assert!(resolve_with(&[authority.as_str()], &watch_url).await.is_empty());
}
