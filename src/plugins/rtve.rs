//! RTVE Play: live channels and video on demand.
//!
//! The page only carries an asset id. Playable URLs are published in an
//! obfuscated thumbnail container; when that yields nothing, a generic HLS
//! URL template is used instead.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    error::PluginError,
    plugin::{Plugin, Stream, Subtitle},
};
use crate::{
    common::HttpClient,
    configs::Config,
    ztnr::{self, DecodedUrl, PreferredUrl},
};

const URL_M3U8: &str = "https://ztnr.rtve.es/ztnr/{id}.m3u8";
const URL_VIDEOS: &str = "https://ztnr.rtve.es/ztnr/movil/thumbnail/rtveplayw/videos/{id}.png?q=v2";
const URL_SUBTITLES: &str = "https://www.rtve.es/api/videos/{id}/subtitulos.json";

#[derive(Debug, Deserialize)]
struct SubtitlesResponse {
    page: SubtitlesPage,
}

#[derive(Debug, Deserialize)]
struct SubtitlesPage {
    #[serde(default)]
    items: Vec<SubtitleItem>,
}

#[derive(Debug, Deserialize)]
struct SubtitleItem {
    lang: String,
    src: String,
}

pub struct RtvePlugin {
    http: reqwest::Client,
    url_regex: Regex,
    setup_regex: Regex,
    mux_subtitles: bool,
}

impl RtvePlugin {
    pub fn new(config: &Config) -> Result<Self, PluginError> {
        Ok(Self {
            http: HttpClient::new(&config.http)?,
            url_regex: Regex::new(r"^https?://(?:www\.)?rtve\.es/play/videos/.+").unwrap(),
            setup_regex: Regex::new(r"(?s)\bdata-setup='(\{.+?\})'").unwrap(),
            mux_subtitles: config.rtve.mux_subtitles,
        })
    }

    /// The numeric `idAsset` of the player's `data-setup` attribute.
    fn extract_asset_id(&self, html: &str) -> Option<String> {
        let setup = self.setup_regex.captures(html)?.get(1)?.as_str();
        let json: serde_json::Value = serde_json::from_str(setup).ok()?;

        let id = match json.get("idAsset")? {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.as_u64()?.to_string(),
            _ => return None,
        };

        (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, PluginError> {
        let text = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn decoded_urls(&self, id: &str) -> Result<Vec<DecodedUrl>, PluginError> {
        let blob = self.fetch_text(&URL_VIDEOS.replace("{id}", id)).await?;
        Ok(ztnr::translate(&blob)?.collect())
    }

    async fn subtitles(&self, id: &str) -> Vec<Subtitle> {
        let url = URL_SUBTITLES.replace("{id}", id);
        let parsed = match self.fetch_text(&url).await {
            Ok(text) => serde_json::from_str::<SubtitlesResponse>(&text).map_err(PluginError::from),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(response) => response
                .page
                .items
                .into_iter()
                .map(|item| Subtitle {
                    lang: item.lang,
                    url: force_https(&item.src),
                })
                .collect(),
            Err(e) => {
                debug!("No subtitles for asset {}: {}", id, e);
                Vec::new()
            }
        }
    }
}

/// Rewrites any scheme (or a scheme-relative URL) to `https://`.
fn force_https(src: &str) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{rest}");
    }
    match src.split_once("://") {
        Some((_, rest)) => format!("https://{rest}"),
        None => format!("https://{src}"),
    }
}

#[async_trait]
impl Plugin for RtvePlugin {
    fn name(&self) -> &str {
        "rtve"
    }

    fn can_handle_url(&self, url: &str) -> bool {
        self.url_regex.is_match(url)
    }

    async fn streams(&self, url: &str) -> Result<Vec<(String, Stream)>, PluginError> {
        let page = match self.fetch_text(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch RTVE page {}: {}", url, e);
                return Ok(Vec::new());
            }
        };
        let Some(id) = self.extract_asset_id(&page) else {
            debug!("No asset id found on {}", url);
            return Ok(Vec::new());
        };

        let fallback = || URL_M3U8.replace("{id}", &id);
        let playlist = match self.decoded_urls(&id).await {
            Ok(urls) if !urls.is_empty() => match ztnr::select_preferred(&urls) {
                Some(PreferredUrl::Hls(url)) => url,
                Some(PreferredUrl::Progressive(url)) => {
                    return Ok(vec![("vod".to_string(), Stream::Http { url })]);
                }
                None => {
                    debug!("Asset {} decoded to {} unusable URLs", id, urls.len());
                    return Ok(Vec::new());
                }
            },
            Ok(_) => fallback(),
            Err(e) => {
                debug!("Obfuscated URLs unavailable for asset {}: {}", id, e);
                fallback()
            }
        };
        debug!("RTVE asset {} playlist: {}", id, playlist);

        let subtitles = if self.mux_subtitles {
            self.subtitles(&id).await
        } else {
            Vec::new()
        };

        Ok(vec![(
            "hls".to_string(),
            Stream::Hls {
                url: playlist,
                subtitles,
            },
        )])
    }
}
