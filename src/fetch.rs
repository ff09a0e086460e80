//! # Map Snapshot Retrieval
//!
//! The one phase of a render that may suspend. All image blocks of a report
//! are fetched concurrently before layout starts; layout itself only ever
//! reads the resulting [`ImageSet`].
//!
//! A failed fetch or decode is recorded in the set and later drawn as a
//! placeholder. It is never returned as an error.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};

use crate::image_loader::{self, decode_image_bytes, ImageError, LoadedImage};
use crate::model::Block;

/// Something that can turn an image URL into bytes.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// Resolves data URIs, raw base64 and explicit file paths. No network.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImageSource;

impl ImageSource for LocalImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        if image_loader::is_remote(url) {
            return Err(ImageError::Fetch(format!(
                "network sources are not enabled: {}",
                url
            )));
        }
        image_loader::read_local_bytes(url)
    }
}

/// Fetches `http(s)://` URLs with reqwest; everything else resolves locally.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Build a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageError::Fetch(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        if !image_loader::is_remote(url) {
            return image_loader::read_local_bytes(url);
        }

        debug!("Fetching map image {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(format!("failed to read body: {}", e)))?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Outcome of loading every image a block sequence references, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    entries: BTreeMap<String, Result<Arc<LoadedImage>, ImageError>>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, result: Result<LoadedImage, ImageError>) {
        self.entries.insert(url.to_string(), result.map(Arc::new));
    }

    /// The loaded image for `url`, or the reason it is unavailable.
    ///
    /// URLs that were never resolved report a fetch failure.
    pub fn get(&self, url: &str) -> Result<Arc<LoadedImage>, ImageError> {
        match self.entries.get(url) {
            Some(entry) => entry.clone(),
            None => Err(ImageError::Fetch(format!("image was not fetched: {}", url))),
        }
    }
}

/// Fetch and decode every image referenced by `blocks`, concurrently.
pub async fn resolve_images<S: ImageSource>(blocks: &[Block], source: &S) -> ImageSet {
    let mut urls: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Image(img) => Some(img.source_url.as_str()),
            _ => None,
        })
        .collect();
    urls.sort_unstable();
    urls.dedup();

    let results = join_all(urls.iter().map(|url| async move {
        let result = source
            .fetch(url)
            .await
            .and_then(|bytes| decode_image_bytes(&bytes));
        (*url, result)
    }))
    .await;

    let mut set = ImageSet::new();
    for (url, result) in results {
        if let Err(ref e) = result {
            warn!("Map image {} unavailable, using placeholder: {}", url, e);
        }
        set.insert(url, result);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageBlock;
    use std::collections::HashMap;

    struct StubSource {
        responses: HashMap<String, Result<Vec<u8>, ImageError>>,
    }

    impl ImageSource for StubSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(ImageError::Status(404)))
        }
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    fn image_block(url: &str) -> Block {
        Block::Image(ImageBlock {
            source_url: url.to_string(),
            caption: "Map".to_string(),
        })
    }

    #[tokio::test]
    async fn failures_are_recorded_not_raised() {
        let mut responses = HashMap::new();
        responses.insert("https://maps/ok.png".to_string(), Ok(png(4, 2)));
        responses.insert("https://maps/garbage".to_string(), Ok(vec![1, 2, 3, 4, 5]));
        let source = StubSource { responses };

        let blocks = vec![
            image_block("https://maps/ok.png"),
            image_block("https://maps/missing.png"),
            image_block("https://maps/garbage"),
            Block::PageBreak,
        ];
        let set = resolve_images(&blocks, &source).await;

        assert_eq!(set.get("https://maps/ok.png").unwrap().width_px, 4);
        assert_eq!(set.get("https://maps/missing.png").unwrap_err(), ImageError::Status(404));
        assert_eq!(set.get("https://maps/garbage").unwrap_err(), ImageError::Unsupported);
    }

    #[tokio::test]
    async fn local_source_refuses_network() {
        let err = LocalImageSource.fetch("https://example.com/a.png").await.unwrap_err();
        assert!(matches!(err, ImageError::Fetch(_)));
    }

    /// Serve one canned HTTP response on a loopback port and return its URL.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/map.png", addr)
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let source = HttpImageSource::new(Duration::from_secs(5)).unwrap();
        let err = source.fetch(&url).await.unwrap_err();
        assert_eq!(err, ImageError::Status(404));
    }

    #[tokio::test]
    async fn http_failure_becomes_an_unavailable_image() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let source = HttpImageSource::new(Duration::from_secs(5)).unwrap();
        let set = resolve_images(&[image_block(&url)], &source).await;
        assert_eq!(set.get(&url).unwrap_err(), ImageError::Status(503));
    }

    #[tokio::test]
    async fn http_body_is_decoded() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nabcd",
        )
        .await;
        let source = HttpImageSource::new(Duration::from_secs(5)).unwrap();
        assert_eq!(source.fetch(&url).await.unwrap(), b"abcd".to_vec());
    }

    #[test]
    fn unknown_url_is_a_fetch_failure() {
        let set = ImageSet::new();
        assert!(matches!(set.get("x"), Err(ImageError::Fetch(_))));
    }
}
