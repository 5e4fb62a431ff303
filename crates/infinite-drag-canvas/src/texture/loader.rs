//! Fire-and-forget thumbnail fetching.
//!
//! Requests go to a background thread running a current-thread tokio runtime;
//! decoded images come back over a channel the frame loop drains.

use image::RgbaImage;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("loader unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<RgbaImage, ThumbnailError>,
}

/// Where thumbnails come from.
pub trait ThumbnailSource {
    /// Starts loading `url`. Must not block.
    fn request(&mut self, url: &str);
    /// Every outcome completed since the last call.
    fn drain(&mut self) -> Vec<FetchOutcome>;
}

pub struct HttpThumbnailSource {
    requests: tokio::sync::mpsc::UnboundedSender<String>,
    results: flume::Receiver<FetchOutcome>,
    results_tx: flume::Sender<FetchOutcome>,
    _worker: Option<thread::JoinHandle<()>>,
}

impl HttpThumbnailSource {
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let (res_tx, res_rx) = flume::unbounded();
        let worker_tx = res_tx.clone();

        // Without a worker every request reports `Unavailable`.
        let worker = thread::Builder::new()
            .name("thumbnail-loader".into())
            .spawn(move || run_worker(req_rx, worker_tx))
            .map_err(|e| log::error!("Failed to spawn thumbnail loader thread: {}", e))
            .ok();

        Self {
            requests: req_tx,
            results: res_rx,
            results_tx: res_tx,
            _worker: worker,
        }
    }
}

impl ThumbnailSource for HttpThumbnailSource {
    fn request(&mut self, url: &str) {
        if self.requests.send(url.to_string()).is_err() {
            let _ = self.results_tx.send(FetchOutcome {
                url: url.to_string(),
                result: Err(ThumbnailError::Unavailable("loader thread exited".into())),
            });
        }
    }

    fn drain(&mut self) -> Vec<FetchOutcome> {
        self.results.try_iter().collect()
    }
}

fn run_worker(
    mut requests: tokio::sync::mpsc::UnboundedReceiver<String>,
    results: flume::Sender<FetchOutcome>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Thumbnail loader runtime failed to start: {}", e);
            reject_queued(&mut requests, &results, "loader runtime failed to start");
            return;
        }
    };

    rt.block_on(async move {
        let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                log::error!("Thumbnail HTTP client failed to build: {}", e);
                reject_queued(&mut requests, &results, "HTTP client failed to build");
                return;
            }
        };
        while let Some(url) = requests.recv().await {
            let client = client.clone();
            let results = results.clone();
            tokio::spawn(async move {
                let result = fetch_thumbnail(&client, &url).await;
                if let Err(e) = &result {
                    log::debug!("Thumbnail {} failed: {}", url, e);
                }
                // Receiver gone means the factory was dropped; nothing to do.
                let _ = results.send(FetchOutcome { url, result });
            });
        }
        log::debug!("Thumbnail loader shutting down");
    });
}

/// Closes the request queue and answers everything still in it, so no URL
/// stays pending. Later `request` calls fail to send and answer themselves.
fn reject_queued(
    requests: &mut tokio::sync::mpsc::UnboundedReceiver<String>,
    results: &flume::Sender<FetchOutcome>,
    reason: &str,
) {
    requests.close();
    while let Ok(url) = requests.try_recv() {
        let _ = results.send(FetchOutcome {
            url,
            result: Err(ThumbnailError::Unavailable(reason.to_string())),
        });
    }
}

async fn fetch_thumbnail(client: &reqwest::Client, url: &str) -> Result<RgbaImage, ThumbnailError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_requests_are_answered_when_worker_gives_up() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let (res_tx, res_rx) = flume::unbounded();
        tx.send("a".into()).unwrap();
        tx.send("b".into()).unwrap();

        reject_queued(&mut rx, &res_tx, "down");

        let outcomes: Vec<FetchOutcome> = res_rx.try_iter().collect();
        let urls: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
        assert!(outcomes
            .iter()
            .all(|o| matches!(&o.result, Err(ThumbnailError::Unavailable(r)) if r == "down")));
        assert!(tx.send("c".into()).is_err());
    }

    #[test]
    fn request_after_shutdown_reports_unavailable() {
        let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let (res_tx, res_rx) = flume::unbounded();
        drop(req_rx);
        let mut source = HttpThumbnailSource {
            requests: req_tx,
            results: res_rx,
            results_tx: res_tx,
            _worker: None,
        };

        source.request("x");
        let outcomes = source.drain();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].url, "x");
        assert!(matches!(outcomes[0].result, Err(ThumbnailError::Unavailable(_))));
    }
}
