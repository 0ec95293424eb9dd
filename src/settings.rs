//! Functions for loading render backend settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::video::errors::Error as VideoError;

/// A structure containing configuration data for the render backend, which
/// is used to pick the backend executor and to tune the frame hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the graphics API, "opengl", "vulkan" or "headless".
    pub render_api: String,
    /// The initial viewport of the backend.
    pub window: WindowParams,
    pub behaviour: BehaviourParams,
    /// Selects how many dirty categories of a batch are serviced per tick.
    pub dirty_dispatch: DirtyDispatch,
    /// Capacity of the bounded event channel towards the render thread.
    pub channel_capacity: usize,
    /// Upper bound of the blocking wait for a rendered frame. Waits forever
    /// if not set.
    pub frame_timeout_ms: Option<u64>,
    pub clear_color: [f32; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            render_api: "opengl".to_owned(),
            window: WindowParams::default(),
            behaviour: BehaviourParams::default(),
            dirty_dispatch: DirtyDispatch::All,
            channel_capacity: 16,
            frame_timeout_ms: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            x: 0,
            y: 0,
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourParams {
    /// Forwards `resize` requests to the backend as viewport changes.
    pub resize_viewport: bool,
}

impl Default for BehaviourParams {
    fn default() -> Self {
        BehaviourParams {
            resize_viewport: true,
        }
    }
}

/// Policy used when a batch has several dirty categories at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyDispatch {
    /// Services every set category, in matrix, uniform, mesh update, mesh order.
    All,
    /// Services only the first set category of that order. The other bits are
    /// dropped along with it.
    FirstMatch,
}

impl Default for DirtyDispatch {
    fn default() -> Self {
        DirtyDispatch::All
    }
}

/// The graphics APIs a backend executor could be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderApi {
    OpenGL,
    Vulkan,
    Headless,
}

impl Settings {
    /// Parses settings from a JSON document. Missing keys take their default.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings = serde_json::from_str(json)?;
        Ok(settings)
    }

    /// Loads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|err| format_err!("Failed to read settings {:?}: {}", path, err))?;
        Self::from_json(&json)
    }

    /// Resolves the `render_api` string. Names are matched exactly.
    pub fn render_api(&self) -> ::std::result::Result<RenderApi, VideoError> {
        match self.render_api.as_str() {
            "opengl" => Ok(RenderApi::OpenGL),
            "vulkan" => Ok(RenderApi::Vulkan),
            "headless" => Ok(RenderApi::Headless),
            _ => Err(VideoError::UnknownRenderApi(self.render_api.clone())),
        }
    }

    #[inline]
    pub fn headless() -> Self {
        Settings {
            render_api: "headless".to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.render_api().unwrap(), RenderApi::OpenGL);
        assert_eq!(settings.window.width, 1024);
        assert_eq!(settings.window.height, 768);
        assert!(settings.behaviour.resize_viewport);
        assert_eq!(settings.dirty_dispatch, DirtyDispatch::All);
    }

    #[test]
    fn unknown_api() {
        let mut settings = Settings::default();
        settings.render_api = "metal".to_owned();
        assert!(settings.render_api().is_err());

        settings.render_api = "OpenGL".to_owned();
        assert!(settings.render_api().is_err());
        settings.render_api = " headless".to_owned();
        assert!(settings.render_api().is_err());
    }
}
