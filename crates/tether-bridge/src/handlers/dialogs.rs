// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toasts, the share sheet, alerts, action sheets and the date picker.
//
// The modal ones are host requests: the dialog is shown through the
// platform and the call settles when the host reports the user's choice.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tether_core::error::{Result, TetherError};
use tether_core::types::{ButtonStyle, DatePickerMode};

use super::{non_empty, required};
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::platform::traits::{DatePickerRequest, DialogButton};
use crate::registry::{Handler, RegistryBuilder};

/// Android shows at most three alert buttons.
pub const MAX_ALERT_BUTTONS: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToastRequest {
    pub message: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShareRequest {
    pub text: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResult {
    pub success: bool,
}

/// One entry of `buttons` / `options`. Entries that are not objects get
/// a positional label.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ButtonSpec {
    pub text: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub buttons: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResult {
    pub button_index: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActionSheetRequest {
    pub title: Option<String>,
    pub options: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionSheetResult {
    pub index: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatePickerPayload {
    pub mode: Option<String>,
    pub date: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// What the host reports once the picker closes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PickedDate {
    millis: Option<i64>,
    cancelled: bool,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatePickerResult {
    Picked { date: String },
    Cancelled { cancelled: bool },
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("toast", |ctx: &HandlerContext, req: ToastRequest| -> Result<()> {
            let message = required(req.message, "Missing message parameter")?;
            let long = req.duration.as_deref() == Some("long");
            ctx.platform().show_toast(&message, long)
        })
        .sync("share", share)
        .handler("alert", Alert)
        .handler("actionsheet.show", ActionSheet)
        .handler("datepicker.show", DatePicker)
}

fn share(ctx: &HandlerContext, req: ShareRequest) -> Result<ShareResult> {
    let text = [non_empty(req.text.as_deref()), non_empty(req.url.as_deref())]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return Err(TetherError::invalid("Nothing to share"));
    }
    let title = non_empty(req.title.as_deref()).unwrap_or("Share");
    ctx.platform().share_text(&text, Some(title))?;
    Ok(ShareResult { success: true })
}

fn buttons(specs: &[Value], limit: usize, fallback: &str) -> Vec<DialogButton> {
    specs
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, spec)| {
            let spec: ButtonSpec = serde_json::from_value(spec.clone()).unwrap_or_default();
            DialogButton {
                text: spec.text.unwrap_or_else(|| format!("{fallback} {i}")),
                style: ButtonStyle::from_name(spec.style.as_deref().unwrap_or("default")),
            }
        })
        .collect()
}

struct Alert;

impl Handler for Alert {
    type Request = AlertRequest;
    type Response = AlertResult;

    fn handle(&self, ctx: &HandlerContext, req: AlertRequest, done: Completion<AlertResult>) {
        let title = non_empty(req.title.as_deref()).map(str::to_owned);
        let message = non_empty(req.message.as_deref()).map(str::to_owned);
        if title.is_none() && message.is_none() {
            done.error("Missing title or message");
            return;
        }

        let mut buttons = buttons(&req.buttons, MAX_ALERT_BUTTONS, "Button");
        if buttons.is_empty() {
            buttons.push(DialogButton {
                text: "OK".into(),
                style: ButtonStyle::Default,
            });
        }

        ctx.host_request(
            done,
            |platform, token| {
                platform.show_alert(token, title.as_deref(), message.as_deref(), &buttons)
            },
            |_, reply| Ok(serde_json::from_value(reply)?),
        );
    }
}

struct ActionSheet;

impl Handler for ActionSheet {
    type Request = ActionSheetRequest;
    type Response = ActionSheetResult;

    fn handle(
        &self,
        ctx: &HandlerContext,
        req: ActionSheetRequest,
        done: Completion<ActionSheetResult>,
    ) {
        if req.options.is_empty() {
            done.error("Missing 'options' array");
            return;
        }
        let options = buttons(&req.options, usize::MAX, "Option");
        let title = non_empty(req.title.as_deref()).map(str::to_owned);

        ctx.host_request(
            done,
            |platform, token| platform.show_action_sheet(token, title.as_deref(), &options),
            |_, reply| Ok(serde_json::from_value(reply)?),
        );
    }
}

struct DatePicker;

impl Handler for DatePicker {
    type Request = DatePickerPayload;
    type Response = DatePickerResult;

    fn handle(
        &self,
        ctx: &HandlerContext,
        req: DatePickerPayload,
        done: Completion<DatePickerResult>,
    ) {
        let request = DatePickerRequest {
            mode: DatePickerMode::from_name(req.mode.as_deref().unwrap_or("date")),
            initial_ms: req.date.as_deref().and_then(parse_iso_millis),
            min_ms: req.min.as_deref().and_then(parse_iso_millis),
            max_ms: req.max.as_deref().and_then(parse_iso_millis),
        };

        ctx.host_request(
            done,
            |platform, token| platform.show_date_picker(token, &request),
            |_, reply| {
                let picked: PickedDate = serde_json::from_value(reply)?;
                match picked.millis {
                    Some(millis) if !picked.cancelled => Ok(DatePickerResult::Picked {
                        date: format_iso_millis(millis)?,
                    }),
                    _ => Ok(DatePickerResult::Cancelled { cancelled: true }),
                }
            },
        );
    }
}

/// Milliseconds since the epoch for an ISO-8601 timestamp. Values without
/// an offset are taken as UTC; unparseable input is ignored.
pub fn parse_iso_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `yyyy-MM-ddTHH:mm:ss.SSSZ` in UTC.
pub fn format_iso_millis(millis: i64) -> Result<String> {
    let at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| TetherError::platform(format!("Date out of range: {millis}")))?;
    Ok(at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}
