use reqwest::{Client, header};
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use super::models::{AnimeEntry, Episode, SearchItem};
use crate::config::ResolverConfig;
use crate::extractor::{
    error::ExtractorError,
    fetcher::{HttpFetcher, PageFetcher},
    resolver::StreamResolver,
    strategies::scan_media_urls,
    utils::resolve_url,
};
use crate::media::{MediaExtension, StreamDescriptor};

static EPISODE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.bottone-ep[href]").expect("selector is hard-coded, thus must be valid"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("selector is hard-coded, thus must be valid"));
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("selector is hard-coded, thus must be valid"));
static WATCH_ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href^="/watch?file="]"#).expect("selector is hard-coded, thus must be valid")
});
static WATCH_IFRAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"iframe[src^="/watch?file="]"#).expect("selector is hard-coded, thus must be valid")
});
static VIDEO_SOURCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video source[src]").expect("selector is hard-coded, thus must be valid"));

const STREAMING_BUTTON_TEXT: &str = "Guarda lo streaming";

fn base_for_join(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Maps the search endpoint's `[{name, link}]` to catalog entries.
pub fn parse_search_results(body: &str, base_url: &str) -> Result<Vec<AnimeEntry>, ExtractorError> {
    let items: Vec<SearchItem> = serde_json::from_str(body)?;
    let base = base_url.trim_end_matches('/');
    Ok(items
        .into_iter()
        .map(|item| AnimeEntry {
            title: item.name,
            url: format!("{base}/anime/{}", item.link.trim_start_matches('/')),
        })
        .collect())
}

pub fn parse_episodes(html: &str, base_url: &str) -> Vec<Episode> {
    let document = Html::parse_document(html);
    let base = base_for_join(base_url);

    document
        .select(&EPISODE_SELECTOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let url = resolve_url(href, &base)?;
            let title = a.text().collect::<Vec<_>>().join(" ");
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            Some(Episode { title, url })
        })
        .collect()
}

/// Finds the watch page an episode page links to.
///
/// Prefers the "Guarda lo streaming" button, then any anchor or iframe
/// pointing at `/watch?file=`.
pub fn parse_watch_url(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let base = base_for_join(base_url);

    let button = document.select(&ANCHOR_SELECTOR).find(|a| {
        a.select(&DIV_SELECTOR)
            .next()
            .is_some_and(|div| div.text().collect::<String>().contains(STREAMING_BUTTON_TEXT))
    });
    if let Some(href) = button.and_then(|a| a.value().attr("href")) {
        return resolve_url(href, &base);
    }

    document
        .select(&WATCH_ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .chain(
            document
                .select(&WATCH_IFRAME_SELECTOR)
                .filter_map(|f| f.value().attr("src")),
        )
        .find_map(|link| resolve_url(link, &base))
}

/// The first `.mp4` in the page, else the first `<video><source>`.
fn first_stream_url(html: &str, page_url: &str) -> Option<String> {
    if let Some(mp4) = scan_media_urls(html)
        .into_iter()
        .find(|u| MediaExtension::from_url(u) == Some(MediaExtension::Mp4))
    {
        return Some(mp4);
    }
    let document = Html::parse_document(html);
    document
        .select(&VIDEO_SOURCE_SELECTOR)
        .filter_map(|s| s.value().attr("src"))
        .find_map(|src| resolve_url(src, page_url))
}

/// Client for the AnimeSaturn catalog: search, episode lists and streams.
pub struct AnimeSaturn<F = HttpFetcher> {
    client: Client,
    config: Arc<ResolverConfig>,
    resolver: StreamResolver<F>,
}

impl AnimeSaturn<HttpFetcher> {
    pub fn new(config: Arc<ResolverConfig>) -> Result<Self, ExtractorError> {
        let fetcher = HttpFetcher::from_config(config.clone())?;
        let client = fetcher.client().clone();
        Ok(Self::with_fetcher(client, fetcher, config))
    }
}

impl<F: PageFetcher> AnimeSaturn<F> {
    pub fn with_fetcher(client: Client, fetcher: F, config: Arc<ResolverConfig>) -> Self {
        Self {
            client,
            resolver: StreamResolver::new(fetcher, config.clone()),
            config,
        }
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn resolver(&self) -> &StreamResolver<F> {
        &self.resolver
    }

    /// Searches the catalog. `mal_id` is only used for diagnostics.
    pub async fn search(&self, query: &str, mal_id: Option<&str>) -> Result<Vec<AnimeEntry>, ExtractorError> {
        debug!(query = %query, mal_id = ?mal_id, "Searching catalog");
        let key = query
            .split_whitespace()
            .map(|w| urlencoding::encode(w).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        let base = self.base_url();

        let body = self
            .client
            .get(format!("{base}/index.php?search=1&key={key}"))
            .header(header::REFERER, format!("{base}/animelist?search={key}"))
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_search_results(&body, &base)?;
        info!(query = %query, count = results.len(), "Search finished");
        Ok(results)
    }

    pub async fn episodes(&self, anime_url: &str) -> Result<Vec<Episode>, ExtractorError> {
        let page = self.resolver.fetcher().fetch(anime_url).await?;
        Ok(parse_episodes(&page.content, &self.base_url()))
    }

    pub async fn watch_url(&self, episode_url: &str) -> Result<Option<String>, ExtractorError> {
        let page = self.resolver.fetcher().fetch(episode_url).await?;
        let watch_url = parse_watch_url(&page.content, &self.base_url());
        if watch_url.is_none() {
            debug!(url = %episode_url, "Episode page has no watch link");
        }
        Ok(watch_url)
    }

    /// Quick single-stream lookup on a watch page, without the full merge.
    pub async fn first_stream(&self, watch_url: &str) -> Result<Option<StreamDescriptor>, ExtractorError> {
        let page = self.resolver.fetcher().fetch(watch_url).await?;
        Ok(first_stream_url(&page.content, watch_url).map(|url| {
            StreamDescriptor::builder(url, "Direct MP4")
                .referer(watch_url)
                .user_agent(self.config.user_agent.as_str())
                .build()
        }))
    }

    /// Every stream of an episode; an episode without a watch link has none.
    pub async fn all_streams(&self, episode_url: &str) -> Result<Vec<StreamDescriptor>, ExtractorError> {
        match self.watch_url(episode_url).await? {
            Some(watch_url) => Ok(self.resolver.resolve(&watch_url).await),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeFetcher, init_tracing, test_config};

    const BASE: &str = "https://www.animesaturn.cx";

    fn site(fetcher: FakeFetcher) -> AnimeSaturn<FakeFetcher> {
        AnimeSaturn::with_fetcher(Client::new(), fetcher, test_config())
    }

    #[test]
    fn maps_search_items() {
        let body = r#"[{"name":"One Piece","link":"One-Piece-aaaa","image":"x.jpg"},{"name":"One Piece ITA","link":"One-Piece-ITA"}]"#;
        let results = parse_search_results(body, BASE).unwrap();
        assert_eq!(
            results,
            vec![
                AnimeEntry {
                    title: "One Piece".to_string(),
                    url: format!("{BASE}/anime/One-Piece-aaaa")
                },
                AnimeEntry {
                    title: "One Piece ITA".to_string(),
                    url: format!("{BASE}/anime/One-Piece-ITA")
                },
            ]
        );
        assert!(matches!(
            parse_search_results("<html>", BASE),
            Err(ExtractorError::JsonError(_))
        ));
    }

    #[test]
    fn lists_episodes() {
        let html = r#"
            <a class="btn bottone-ep" href="https://www.animesaturn.cx/ep/One-Piece-ep-1">
                Episodio 1
            </a>
            <a class="bottone-ep" href="/ep/One-Piece-ep-2">Episodio   2</a>
            <a class="other" href="/ep/nope">x</a>"#;
        let episodes = parse_episodes(html, BASE);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].title, "Episodio 1");
        assert_eq!(episodes[1].url, format!("{BASE}/ep/One-Piece-ep-2"));
    }

    #[test]
    fn watch_url_prefers_streaming_button() {
        let html = r#"
            <a href="/watch?file=fallback">watch</a>
            <a href="https://www.animesaturn.cx/watch?file=abc"><div class="btn">Guarda lo streaming</div></a>"#;
        assert_eq!(
            parse_watch_url(html, BASE).as_deref(),
            Some("https://www.animesaturn.cx/watch?file=abc")
        );
    }

    #[test]
    fn watch_url_falls_back_to_links_and_iframes() {
        assert_eq!(
            parse_watch_url(r#"<a href="/watch?file=abc">x</a>"#, BASE).as_deref(),
            Some("https://www.animesaturn.cx/watch?file=abc")
        );
        assert_eq!(
            parse_watch_url(r#"<iframe src="/watch?file=def"></iframe>"#, BASE).as_deref(),
            Some("https://www.animesaturn.cx/watch?file=def")
        );
        assert_eq!(parse_watch_url("<p>nothing</p>", BASE), None);
    }

    #[tokio::test]
    async fn first_stream_prefers_mp4_in_source() {
        let watch = format!("{BASE}/watch?file=abc");
        let fetcher = FakeFetcher::new().with_page(
            watch.clone(),
            r#"<video><source src="/hls/a.m3u8"></video><script>var f = "https://cdn.example/ep.mp4";</script>"#,
        );
        let descriptor = site(fetcher).first_stream(&watch).await.unwrap().unwrap();
        assert_eq!(descriptor.url, "https://cdn.example/ep.mp4");
        assert_eq!(descriptor.referer(), Some(watch.as_str()));
    }

    #[tokio::test]
    async fn all_streams_without_watch_link_is_empty() {
        init_tracing();
        let episode = format!("{BASE}/ep/x");
        let fetcher = FakeFetcher::new().with_page(episode.clone(), "<p>no link</p>");
        assert!(site(fetcher).all_streams(&episode).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_streams_follows_watch_link() {
        let episode = format!("{BASE}/ep/x");
        let watch = format!("{BASE}/watch?file=abc");
        let fetcher = FakeFetcher::new()
            .with_page(
                episode.clone(),
                r#"<a href="/watch?file=abc"><div>Guarda lo streaming</div></a>"#,
            )
            .with_page(watch.clone(), r#"<video src="https://cdn.example/a.mp4"></video>"#);
        let streams = site(fetcher).all_streams(&episode).await.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].referer(), Some(watch.as_str()));
    }

    #[tokio::test]
    #[ignore]
    async fn test_search() {
        init_tracing();
        let site = AnimeSaturn::new(Arc::new(ResolverConfig::default())).unwrap();
        let results = site.search("one piece", None).await.unwrap();
        println!("{results:?}");
    }
}
