// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera capture, the gallery picker and microphone recording.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use tether_core::error::{Result, TetherError};
use tether_core::types::{CameraFacing, MediaKind, Permission};

use super::data_url;
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::registry::{Empty, Handler, RegistryBuilder};

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhotoRequest {
    pub quality: Option<i64>,
    pub facing: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Photo {
    pub uri: String,
    /// JPEG data URL.
    pub base64: String,
    pub width: u32,
    pub height: u32,
    /// Encoded JPEG size in bytes.
    pub size: usize,
}

#[derive(Debug, Deserialize)]
struct CapturedUri {
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GalleryRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub multiple: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PickedUris {
    uris: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PickedFile {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Gallery {
    pub files: Vec<PickedFile>,
}

#[derive(Debug, Serialize)]
pub struct RecordingStarted {
    pub status: &'static str,
    /// File name inside the recordings directory.
    pub file: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StopRequest {
    pub base64: bool,
}

#[derive(Debug, Serialize)]
pub struct Recording {
    pub uri: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    // Path of the recording in progress, shared by start and stop.
    let active: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let stop_active = Arc::clone(&active);

    builder
        .handler("camera.photo", CapturePhoto)
        .handler("gallery.pick", PickMedia)
        .sync("microphone.start", move |ctx: &HandlerContext, _: Empty| {
            start_recording(ctx, &active)
        })
        .blocking("microphone.stop", move |ctx: &HandlerContext, req: StopRequest| {
            stop_recording(ctx, &stop_active, req)
        })
}

struct CapturePhoto;

impl Handler for CapturePhoto {
    type Request = PhotoRequest;
    type Response = Photo;

    fn handle(&self, ctx: &HandlerContext, req: PhotoRequest, done: Completion<Photo>) {
        if !ctx.platform().permission_status(Permission::Camera).granted {
            done.finish(Err(TetherError::PermissionDenied(
                "Camera permission not granted. Request permission first.".into(),
            )));
            return;
        }
        let quality = req
            .quality
            .map_or(DEFAULT_JPEG_QUALITY, |q| q.clamp(1, 100) as u8);
        let facing = CameraFacing::from_name(req.facing.as_deref().unwrap_or("back"));

        ctx.host_request(
            done,
            |platform, token| platform.capture_photo(token, facing),
            move |ctx, reply| {
                let captured: CapturedUri = serde_json::from_value(reply)?;
                let bytes = ctx.platform().read_uri(&captured.uri)?;
                encode_photo(captured.uri, &bytes, quality)
            },
        );
    }
}

/// Re-encode captured bytes as JPEG at `quality`.
pub fn encode_photo(uri: String, bytes: &[u8], quality: u8) -> Result<Photo> {
    let decoded = image::load_from_memory(bytes).map_err(|e| {
        warn!(%uri, error = %e, "captured image could not be decoded");
        TetherError::platform("Failed to decode image")
    })?;
    let (width, height) = (decoded.width(), decoded.height());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    decoded
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| TetherError::Image(format!("JPEG encoding failed: {e}")))?;

    debug!(%uri, width, height, bytes = jpeg.len(), quality, "photo encoded");
    Ok(Photo {
        uri,
        base64: data_url("image/jpeg", &jpeg),
        width,
        height,
        size: jpeg.len(),
    })
}

struct PickMedia;

impl Handler for PickMedia {
    type Request = GalleryRequest;
    type Response = Gallery;

    fn handle(&self, ctx: &HandlerContext, req: GalleryRequest, done: Completion<Gallery>) {
        let kind = MediaKind::from_name(req.kind.as_deref().unwrap_or("image"));
        let multiple = req.multiple;

        ctx.host_request(
            done,
            |platform, token| platform.pick_media(token, kind, multiple),
            |_, reply: Value| {
                let picked: PickedUris = serde_json::from_value(reply)?;
                if picked.uris.is_empty() {
                    return Err(TetherError::Cancelled("No image selected".into()));
                }
                let files = picked
                    .uris
                    .into_iter()
                    .map(|uri| PickedFile {
                        name: last_segment(&uri).unwrap_or("file").to_owned(),
                        uri,
                    })
                    .collect();
                Ok(Gallery { files })
            },
        );
    }
}

fn last_segment(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.ends_with(':'))
}

fn start_recording(ctx: &HandlerContext, active: &Mutex<Option<PathBuf>>) -> Result<RecordingStarted> {
    let platform = ctx.platform();
    if !platform.permission_status(Permission::Microphone).granted {
        return Err(TetherError::PermissionDenied(
            "Microphone permission not granted".into(),
        ));
    }

    let mut active = active.lock().unwrap_or_else(|p| p.into_inner());
    if active.is_some() {
        return Err(TetherError::invalid("Recording already in progress"));
    }

    let file = format!("audio_{}.m4a", chrono::Utc::now().timestamp_millis());
    let path = platform
        .recordings_dir()
        .map_err(|e| TetherError::platform(format!("Recording failed: {e}")))?
        .join(&file);
    platform
        .start_recording(&path)
        .map_err(|e| TetherError::platform(format!("Recording failed: {e}")))?;

    info!(path = %path.display(), "recording started");
    *active = Some(path);
    Ok(RecordingStarted {
        status: "recording",
        file,
    })
}

fn stop_recording(
    ctx: &HandlerContext,
    active: &Mutex<Option<PathBuf>>,
    req: StopRequest,
) -> Result<Recording> {
    let path = active
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .take()
        .ok_or_else(|| TetherError::invalid("No recording in progress"))?;

    if let Err(e) = ctx.platform().stop_recording() {
        debug!(error = %e, "recorder stop failed, keeping the file");
    }
    info!(path = %path.display(), "recording stopped");

    let base64 = if req.base64 {
        let bytes = std::fs::read(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "recording unreadable");
            TetherError::platform("Failed to process audio file")
        })?;
        Some(data_url("audio/mp4", &bytes))
    } else {
        None
    };

    let path = path.display().to_string();
    Ok(Recording {
        uri: format!("file://{path}"),
        path,
        base64,
    })
}
