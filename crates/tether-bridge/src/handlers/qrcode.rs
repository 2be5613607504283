// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// qrcode.generate / qrcode.scan

use std::io::Cursor;

use ::qrcode::{Color as Module, QrCode};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tether_core::error::{Result, TetherError};

use super::{data_url, required};
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::registry::{Empty, Handler, RegistryBuilder};

pub const DEFAULT_QR_SIZE: u32 = 256;
pub const MAX_QR_SIZE: u32 = 4096;

/// Light modules around the symbol, per side.
const QUIET_ZONE: u32 = 4;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub data: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedQr {
    /// PNG data URL.
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub data: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "QR_CODE".into()
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .blocking("qrcode.generate", |_ctx: &HandlerContext, req: GenerateRequest| {
            let data = required(req.data, "Missing 'data' field")?;
            let size = req
                .size
                .map_or(DEFAULT_QR_SIZE, |s| s.clamp(1, i64::from(MAX_QR_SIZE)) as u32);
            let (png, dim) = render_png(&data, size)?;
            Ok(GeneratedQr {
                base64: data_url("image/png", &png),
                width: dim,
                height: dim,
            })
        })
        .handler("qrcode.scan", Scan)
}

/// Render `data` as a square greyscale PNG, `size` pixels per side when the
/// symbol fits, larger otherwise. Returns the PNG bytes and the side length.
pub fn render_png(data: &str, size: u32) -> Result<(Vec<u8>, u32)> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| TetherError::QrCode(e.to_string()))?;
    let modules = code.width() as u32;
    let total = modules + 2 * QUIET_ZONE;
    let scale = (size / total).max(1);
    let dim = size.max(total * scale);
    let origin = (dim - total * scale) / 2 + QUIET_ZONE * scale;

    let mut img = GrayImage::from_pixel(dim, dim, Luma([255]));
    for (i, module) in code.to_colors().into_iter().enumerate() {
        if module != Module::Dark {
            continue;
        }
        let (mx, my) = (i as u32 % modules, i as u32 / modules);
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(origin + mx * scale + dx, origin + my * scale + dy, Luma([0]));
            }
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| TetherError::Image(e.to_string()))?;
    debug!(modules, scale, dim, bytes = png.len(), "qr code rendered");
    Ok((png, dim))
}

struct Scan;

impl Handler for Scan {
    type Request = Empty;
    type Response = ScanResult;

    fn handle(&self, ctx: &HandlerContext, _: Empty, done: Completion<ScanResult>) {
        ctx.host_request(
            done,
            |platform, token| platform.scan_qr(token),
            |_, reply| Ok(serde_json::from_value(reply)?),
        );
    }
}
