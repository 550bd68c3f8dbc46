use anyhow::{Result, bail};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// One local track ready to be attached to a peer connection.
#[derive(Clone)]
pub struct LocalTrack {
    pub kind: MediaKind,
    pub track: Arc<TrackLocalStaticSample>,
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("id", &self.track.id())
            .field("stream_id", &self.track.stream_id())
            .finish()
    }
}

/// The camera and microphone tracks of a call.
#[derive(Debug, Clone, Default)]
pub struct LocalMedia {
    pub tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}

/// Where local audio and video come from.
///
/// Acquisition happens before anything is sent to the relay, so a blocked
/// device fails the call cleanly.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia>;
}

/// Opus and VP8 tracks fed by the application through
/// [`TrackLocalStaticSample::write_sample`].
#[derive(Debug, Clone)]
pub struct SyntheticMedia {
    pub audio: bool,
    pub video: bool,
    pub stream_id: String,
}

impl Default for SyntheticMedia {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            stream_id: "telecall".to_string(),
        }
    }
}

impl SyntheticMedia {
    pub fn audio_only() -> Self {
        Self {
            video: false,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MediaSource for SyntheticMedia {
    async fn acquire(&self) -> Result<LocalMedia> {
        if !self.audio && !self.video {
            bail!("Camera / Mic blocked");
        }

        let mut tracks = Vec::new();
        if self.audio {
            tracks.push(LocalTrack {
                kind: MediaKind::Audio,
                track: Arc::new(TrackLocalStaticSample::new(
                    RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_OPUS.to_owned(),
                        clock_rate: 48000,
                        channels: 2,
                        sdp_fmtp_line: String::new(),
                        rtcp_feedback: vec![],
                    },
                    "audio".to_owned(),
                    self.stream_id.clone(),
                )),
            });
        }
        if self.video {
            tracks.push(LocalTrack {
                kind: MediaKind::Video,
                track: Arc::new(TrackLocalStaticSample::new(
                    RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_VP8.to_owned(),
                        clock_rate: 90000,
                        channels: 0,
                        sdp_fmtp_line: String::new(),
                        rtcp_feedback: vec![],
                    },
                    "video".to_owned(),
                    self.stream_id.clone(),
                )),
            });
        }

        Ok(LocalMedia { tracks })
    }
}
