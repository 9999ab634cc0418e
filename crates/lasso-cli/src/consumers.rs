//! Downstream consumers of an extracted selection
//!
//! Thin subprocess wrappers implementing [`SelectionConsumer`]: clipboard
//! write via `wl-copy`, image search via an anonymous host upload plus a
//! Google Lens launch, and OCR via `tesseract`. Each `deliver` call encodes
//! the buffer, dispatches the slow part to a detached thread or subprocess,
//! and returns; nothing here retries or blocks the pipeline.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use lasso_core::encode::{OutputFormat, encode_selection};
use lasso_core::error::{SelectError, SelectResult};
use lasso_core::handoff::SelectionConsumer;
use lasso_core::model::ExtractedSelection;

/// Public Imgur API client id for anonymous, unauthenticated uploads
const IMGUR_CLIENT_ID: &str = "546c25a59c58ad7";

/// Sends a desktop notification; failures are ignored
pub fn notify(icon: &str, summary: &str, body: &str) {
    let _ = Command::new("notify-send")
        .args(["-i", icon, summary, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
}

/// Notifies the user that live mode fell back to static
pub fn notify_fallback() {
    notify(
        "dialog-warning",
        "Live mode unavailable",
        "This compositor has no layer-shell support. Falling back to static mode.",
    );
}

/// Writes the encoded selection to the Wayland clipboard via `wl-copy`
pub struct ClipboardConsumer {
    pub format:  OutputFormat,
    pub quality: u8,
}

impl SelectionConsumer for ClipboardConsumer {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn deliver(&self, selection: ExtractedSelection) -> SelectResult<()> {
        let bytes = encode_selection(&selection, self.format, self.quality)?;
        let mime = self.format.mime();

        let mut child = Command::new("wl-copy")
            .args(["-t", mime])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SelectError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to spawn wl-copy: {e}"),
            )))?;

        // wl-copy forks and owns the clipboard offer; feed it and move on
        // without waiting for it to exit.
        let stdin = child.stdin.take();
        std::thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&bytes);
            }
            let _ = child.wait();
        });

        tracing::info!(mime, "selection dispatched to clipboard");
        Ok(())
    }
}

/// Uploads the selection anonymously and opens Google Lens on the result.
///
/// The upload has no retry logic: on any failure the consumer degrades to
/// opening the Lens home page and notifying the user.
pub struct SearchConsumer {
    /// File the upload subprocess reads; must outlive this process
    pub upload_path: PathBuf,
}

impl SelectionConsumer for SearchConsumer {
    fn name(&self) -> &'static str {
        "search"
    }

    fn deliver(&self, selection: ExtractedSelection) -> SelectResult<()> {
        let bytes = encode_selection(&selection, OutputFormat::Png, 80)?;
        std::fs::write(&self.upload_path, &bytes)?;

        let path = self.upload_path.clone();
        std::thread::spawn(move || {
            notify("image-loading", "Lasso", "Uploading image...");
            match upload_to_imgur(&path) {
                Some(url) => {
                    let lens = format!(
                        "https://lens.google.com/uploadbyurl?url={}",
                        urlencode(&url)
                    );
                    notify("emblem-ok", "Lasso", "Opening Google Lens...");
                    open_url(&lens);
                }
                None => {
                    notify(
                        "dialog-warning",
                        "Upload failed",
                        "Opening Google Lens without the image; paste it manually.",
                    );
                    open_url("https://lens.google.com/");
                }
            }
        });

        tracing::info!(path = %self.upload_path.display(), "selection dispatched to search");
        Ok(())
    }
}

/// Runs `tesseract` on the selection, copies the recognized text to the
/// clipboard, and opens a text search for it
pub struct OcrConsumer {
    pub image_path: PathBuf,
}

impl SelectionConsumer for OcrConsumer {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn deliver(&self, selection: ExtractedSelection) -> SelectResult<()> {
        let bytes = encode_selection(&selection, OutputFormat::Png, 80)?;
        std::fs::write(&self.image_path, &bytes)?;

        let path = self.image_path.clone();
        std::thread::spawn(move || {
            let output = Command::new("tesseract")
                .arg(&path)
                .arg("stdout")
                .output();
            let text = match output {
                Ok(out) if out.status.success() => {
                    String::from_utf8_lossy(&out.stdout).trim().to_string()
                }
                Ok(out) => {
                    tracing::warn!(status = ?out.status, "tesseract failed");
                    String::new()
                }
                Err(e) => {
                    notify(
                        "dialog-error",
                        "OCR unavailable",
                        "tesseract is not installed or failed to run.",
                    );
                    tracing::warn!(error = %e, "failed to spawn tesseract");
                    return;
                }
            };

            if text.is_empty() {
                notify("dialog-information", "Lasso", "No text found in selection.");
                return;
            }

            copy_text(&text);
            let search = format!("https://www.google.com/search?q={}", urlencode(&text));
            notify("emblem-ok", "Lasso", "Text copied; opening search...");
            open_url(&search);
        });

        tracing::info!(path = %self.image_path.display(), "selection dispatched to OCR");
        Ok(())
    }
}

fn upload_to_imgur(path: &std::path::Path) -> Option<String> {
    let output = Command::new("curl")
        .args(["-s", "-X", "POST"])
        .args(["-H", &format!("Authorization: Client-ID {IMGUR_CLIENT_ID}")])
        .arg("-F")
        .arg(format!("image=@{}", path.display()))
        .arg("https://api.imgur.com/3/image")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    response["data"]["link"].as_str().map(str::to_string)
}

fn open_url(url: &str) {
    let _ = Command::new("xdg-open")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
}

fn copy_text(text: &str) {
    if let Ok(mut child) = Command::new("wl-copy")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(text.as_bytes());
        }
        let _ = child.wait();
    }
}

/// Percent-encodes a query/url component
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
