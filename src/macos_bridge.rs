use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::ffi::{c_char, CStr, CString};

extern "C" {
    fn macaux_capture_main_screen(out_width: *mut u32, out_height: *mut u32) -> *mut u8;
    fn macaux_recognize_text(
        rgba: *const u8,
        width: u32,
        height: u32,
        languages_json: *const c_char,
    ) -> *mut c_char;

    fn macaux_free_buffer(ptr: *mut u8);
    fn macaux_free_string(ptr: *mut c_char);
}

/// An RGBA8 frame copied out of the Swift capture buffer.
#[derive(Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// One Vision observation as serialized by the Swift side.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionObservation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

/// Returns `None` when the window server produced no image at all.
pub fn capture_main_screen() -> Option<RawFrame> {
    unsafe {
        let mut width: u32 = 0;
        let mut height: u32 = 0;
        let ptr = macaux_capture_main_screen(&mut width as *mut u32, &mut height as *mut u32);

        if ptr.is_null() {
            return None;
        }

        let length = width as usize * height as usize * 4;
        let rgba = if length == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(ptr, length).to_vec()
        };
        macaux_free_buffer(ptr);

        Some(RawFrame {
            width,
            height,
            rgba,
        })
    }
}

pub fn recognize_text(
    rgba: &[u8],
    width: u32,
    height: u32,
    languages: &[String],
) -> Result<Vec<VisionObservation>> {
    if rgba.len() != width as usize * height as usize * 4 {
        bail!(
            "RGBA buffer of {} bytes does not match {}x{}",
            rgba.len(),
            width,
            height
        );
    }

    let languages_json =
        serde_json::to_string(languages).context("Failed to encode recognition languages")?;
    let c_languages =
        CString::new(languages_json).context("recognition languages contain a null byte")?;

    unsafe {
        let ptr = macaux_recognize_text(rgba.as_ptr(), width, height, c_languages.as_ptr());
        if ptr.is_null() {
            bail!("Swift returned null text recognition result");
        }

        let json = c_ptr_to_string(ptr);
        macaux_free_string(ptr);

        let json = json.context("Failed to decode recognition result")?;
        serde_json::from_str(&json).context("Failed to parse recognition result JSON")
    }
}

unsafe fn c_ptr_to_string(ptr: *mut c_char) -> Result<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }

    let c_str = CStr::from_ptr(ptr);
    c_str
        .to_str()
        .map(|s| s.to_owned())
        .map_err(|e| anyhow!(e))
}
