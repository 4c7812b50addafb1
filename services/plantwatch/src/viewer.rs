//! Orientation model for the 3D sensor viewer
//!
//! The page only renders; drag, double-click and auto-spin are resolved here
//! so every open dashboard shows the same orientation.

use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

use crate::config::ViewerConfig;

/// Radians of rotation per pixel of mouse movement
pub const ROTATION_SPEED: f64 = 0.007;

/// Radians of idle spin about the model's Y axis per rendered frame
pub const SPIN_PER_FRAME: f64 = 0.015;

/// Frame length the spin rate refers to
pub const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Current rotation of the model plus the active drag anchor
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOrientation {
    rotation: UnitQuaternion<f64>,
    drag_anchor: Option<(f64, f64)>,
    pending_spin: Duration,
}

impl Default for ModelOrientation {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            drag_anchor: None,
            pending_spin: Duration::ZERO,
        }
    }
}

impl ModelOrientation {
    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Mouse button pressed at canvas position (`x`, `y`)
    pub fn press(&mut self, x: f64, y: f64) {
        self.drag_anchor = Some((x, y));
    }

    /// Mouse moved to (`x`, `y`); rotates only while a drag is active
    pub fn drag(&mut self, x: f64, y: f64) -> bool {
        let Some((prev_x, prev_y)) = self.drag_anchor else {
            return false;
        };

        let delta_y_rot =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), (x - prev_x) * ROTATION_SPEED);
        let delta_x_rot =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), (y - prev_y) * ROTATION_SPEED);

        self.rotation = delta_x_rot * (delta_y_rot * self.rotation);
        self.drag_anchor = Some((x, y));
        true
    }

    /// Mouse released or left the canvas
    pub fn release(&mut self) {
        self.drag_anchor = None;
    }

    /// Double click: back to the identity orientation
    pub fn reset(&mut self) {
        self.rotation = UnitQuaternion::identity();
    }

    /// Apply idle spin for `elapsed` wall time, one step per whole frame
    pub fn advance(&mut self, elapsed: Duration) {
        self.pending_spin += elapsed;
        let frames = (self.pending_spin.as_nanos() / FRAME.as_nanos()) as u32;
        if frames == 0 {
            return;
        }
        self.pending_spin -= FRAME * frames;

        let spin = UnitQuaternion::from_axis_angle(
            &Vector3::y_axis(),
            SPIN_PER_FRAME * f64::from(frames),
        );
        self.rotation *= spin;
    }

    /// Quaternion as `[x, y, z, w]`, the order three.js expects
    pub fn as_xyzw(&self) -> [f64; 4] {
        let q = self.rotation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

/// Camera placement for the scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSettings {
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
}

/// Static description of the scene the page builds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerScene {
    pub model_path: String,
    pub texture_path: String,
    pub mesh_name: String,
    pub scale: f64,
    pub background: String,
    pub camera: CameraSettings,
}

impl ViewerScene {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            texture_path: config.texture_path.clone(),
            mesh_name: config.mesh_name.clone(),
            scale: config.scale,
            background: "#f8f9fa".to_string(),
            camera: CameraSettings {
                fov: 75.0,
                near: 0.1,
                far: 1000.0,
                position: [0.0, 0.0, 50.0],
            },
        }
    }
}
