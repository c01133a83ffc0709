//! YouTube source adapter: video-id parsing, caption transcript fetch,
//! and metadata via the oEmbed endpoint.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use lernwerk_core::{ExtractedContent, PipelineError, SourceDescriptor};

use crate::adapter::{get_ok, get_with_retry, SourceAdapter};

pub struct YoutubeAdapter {
    client: reqwest::Client,
}

impl YoutubeAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Extract the video id from the URL forms the client sends.
///
/// Recognized: `youtu.be/<id>`, `/watch?v=<id>`, `/embed/<id>`,
/// `/v/<id>`, `/shorts/<id>`.
pub fn parse_video_id(raw: &str) -> Result<String, PipelineError> {
    let url = Url::parse(raw)
        .map_err(|_| PipelineError::InvalidInput(format!("not a valid URL: {raw}")))?;

    let host = url.host_str().unwrap_or("");
    let id = if host == "youtu.be" {
        url.path().trim_start_matches('/').to_string()
    } else if host == "www.youtube.com" || host == "youtube.com" || host == "m.youtube.com" {
        let path = url.path();
        if path == "/watch" {
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        } else if let Some(rest) = path
            .strip_prefix("/embed/")
            .or_else(|| path.strip_prefix("/v/"))
            .or_else(|| path.strip_prefix("/shorts/"))
        {
            rest.split('/').next().unwrap_or("").to_string()
        } else {
            String::new()
        }
    } else {
        String::new()
    };

    // Any non-empty URL-safe id proceeds; whether the video exists is the
    // fetch stage's call, not the parser's.
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(id)
    } else {
        Err(PipelineError::InvalidInput(format!(
            "URL does not contain a recognizable video id: {raw}"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
    #[serde(default)]
    author_name: String,
}

/// Title and author from the public oEmbed endpoint. A non-2xx here means
/// the video is private or deleted.
async fn fetch_metadata(
    client: &reqwest::Client,
    video_url: &str,
) -> Result<OembedResponse, PipelineError> {
    let oembed_url = format!(
        "https://www.youtube.com/oembed?url={}&format=json",
        urlencode(video_url)
    );
    let resp = get_with_retry(client, &oembed_url).await?;
    match resp.status().as_u16() {
        200 => resp
            .json::<OembedResponse>()
            .await
            .map_err(|e| PipelineError::UnavailableSource(format!("bad oEmbed response: {e}"))),
        401 | 403 | 404 => Err(PipelineError::UnavailableSource(
            "video is private, deleted, or unavailable".into(),
        )),
        status => Err(PipelineError::UnavailableSource(format!(
            "oEmbed returned HTTP {status}"
        ))),
    }
}

/// Percent-encode the handful of characters that matter in a query value.
fn urlencode(s: &str) -> String {
    s.replace('%', "%25")
        .replace('&', "%26")
        .replace('?', "%3F")
        .replace('=', "%3D")
        .replace('#', "%23")
}

/// Pull the first caption track URL out of a watch-page payload.
fn find_caption_track(page: &str) -> Option<String> {
    // "captionTracks":[{"baseUrl":"..."} — the URL is JSON-escaped.
    let re = Regex::new(r#""captionTracks":\s*\[\{"baseUrl":"([^"]+)""#).ok()?;
    let captured = re.captures(page)?.get(1)?.as_str();
    Some(captured.replace("\\u0026", "&").replace("\\/", "/"))
}

/// Duration in seconds from the embedded player response, when present.
fn find_duration_seconds(page: &str) -> Option<u64> {
    let re = Regex::new(r#""lengthSeconds":\s*"(\d+)""#).ok()?;
    re.captures(page)?.get(1)?.as_str().parse().ok()
}

/// Flatten timedtext XML into one transcript string.
fn transcript_from_timedtext(xml: &str) -> String {
    let tag = Regex::new(r"<[^>]+>").expect("static regex");
    let mut parts = Vec::new();
    for segment in xml.split("</text>") {
        if let Some(idx) = segment.find('>') {
            let text = tag.replace_all(&segment[idx + 1..], " ");
            let text = decode_entities(text.trim());
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    parts.join(" ")
}

pub(crate) fn decode_entities(s: &str) -> String {
    s.replace("&amp;#39;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
    async fn extract(
        &self,
        source: &SourceDescriptor,
    ) -> Result<ExtractedContent, PipelineError> {
        let video_url = match source {
            SourceDescriptor::YoutubeUrl(u) => u,
            other => {
                return Err(PipelineError::InvalidInput(format!(
                    "youtube adapter cannot handle a {} source",
                    other.source_type()
                )))
            }
        };
        let video_id = parse_video_id(video_url)?;
        info!(video_id, "extracting YouTube source");

        let metadata = fetch_metadata(&self.client, video_url).await?;

        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let page = get_ok(&self.client, &watch_url)
            .await?
            .text()
            .await
            .map_err(|e| PipelineError::UnavailableSource(e.to_string()))?;

        let duration_seconds = find_duration_seconds(&page);

        let Some(track_url) = find_caption_track(&page) else {
            warn!(video_id, "no caption tracks on watch page");
            return Err(PipelineError::UnavailableSource(format!(
                "video {video_id} has no transcript or captions"
            )));
        };

        let xml = get_ok(&self.client, &track_url)
            .await?
            .text()
            .await
            .map_err(|e| PipelineError::UnavailableSource(e.to_string()))?;
        let transcript = transcript_from_timedtext(&xml);
        debug!(video_id, chars = transcript.len(), "transcript fetched");

        if transcript.is_empty() {
            return Err(PipelineError::UnavailableSource(format!(
                "caption track for {video_id} was empty"
            )));
        }

        Ok(ExtractedContent {
            text: transcript,
            title: metadata.title,
            duration_seconds,
            origin_url: Some(video_url.clone()),
        })
    }
}
