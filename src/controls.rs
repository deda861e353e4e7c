//! Damped orbit controls for the orthographic camera.
//!
//! Mouse input is turned into pending deltas (rotation, pan, zoom) which
//! [`OrbitControls::update`] applies once per frame. With damping enabled only
//! a fraction of the pending delta is applied per update and the rest decays,
//! which gives the camera its inertial feel.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::ModifiersState,
};

use crate::{camera::OrthographicCamera, config::ViewerConfig};

const EPS: f32 = 0.000001;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct SphericalDelta {
    theta: f32,
    phi: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
    Dolly,
}

#[derive(Debug)]
pub struct OrbitControls {
    /// Pivot the camera orbits around and looks at.
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    spherical_delta: SphericalDelta,
    pan_offset: Vector3<f32>,
    scale: f32,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
    modifiers: ModifiersState,
}

impl OrbitControls {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            target: Point3::origin(),
            enable_damping: true,
            damping_factor: config.damping_factor,
            enable_rotate: true,
            enable_pan: config.enable_pan,
            enable_zoom: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: SphericalDelta::default(),
            pan_offset: Vector3::zero(),
            scale: 1.0,
            drag: Drag::None,
            cursor: None,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Applies one step of the pending motion to `camera`.
    ///
    /// Returns `true` if the camera moved or its zoom changed.
    pub fn update(&mut self, camera: &mut OrthographicCamera) -> bool {
        let offset = camera.position - self.target;
        let (radius, mut theta, mut phi) = to_spherical(offset);

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.spherical_delta.theta * step;
        phi += self.spherical_delta.phi * step;
        phi = phi.clamp(self.min_polar_angle, self.max_polar_angle);
        phi = phi.clamp(EPS, PI - EPS);

        self.target += self.pan_offset * step;

        let previous_position = camera.position;
        camera.position = self.target + from_spherical(radius, theta, phi);
        camera.target = self.target;

        let mut zoom_changed = false;
        if self.scale != 1.0 {
            let zoom = (camera.zoom / self.scale).clamp(self.min_zoom, self.max_zoom);
            zoom_changed = zoom != camera.zoom;
            camera.zoom = zoom;
            camera.update_projection_matrix();
            self.scale = 1.0;
        }

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = SphericalDelta::default();
            self.pan_offset = Vector3::zero();
        }

        zoom_changed || (camera.position - previous_position).magnitude2() > EPS
    }

    /// Feeds a window event into the controls.
    ///
    /// `viewport` is the surface size in physical pixels; `camera` is only
    /// read to orient pans along the screen axes.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        camera: &OrthographicCamera,
        viewport: (u32, u32),
    ) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Released, _) => Drag::None,
                    (ElementState::Pressed, MouseButton::Left) => {
                        let wants_pan = self.modifiers.control_key()
                            || self.modifiers.shift_key()
                            || self.modifiers.super_key();
                        match (wants_pan, self.enable_pan, self.enable_rotate) {
                            (true, true, _) => Drag::Pan,
                            (false, _, true) => Drag::Rotate,
                            _ => Drag::None,
                        }
                    }
                    (ElementState::Pressed, MouseButton::Right) if self.enable_pan => Drag::Pan,
                    (ElementState::Pressed, MouseButton::Middle) if self.enable_zoom => Drag::Dolly,
                    _ => self.drag,
                };
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.cursor {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    match self.drag {
                        Drag::Rotate => self.rotate(dx, dy, viewport),
                        Drag::Pan => self.pan(dx, dy, camera, viewport),
                        Drag::Dolly => self.dolly_by(-dy),
                        Drag::None => (),
                    }
                }
                self.cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
            }
            WindowEvent::MouseWheel { delta, .. } if self.enable_zoom => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.dolly_by(amount);
            }
            _ => (),
        }
    }

    /// Queues a rotation from a pointer movement of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport: (u32, u32)) {
        if !self.enable_rotate {
            return;
        }
        let height = viewport.1.max(1) as f32;
        self.spherical_delta.theta -= 2.0 * PI * dx * self.rotate_speed / height;
        self.spherical_delta.phi -= 2.0 * PI * dy * self.rotate_speed / height;
    }

    /// Queues a pan from a pointer movement of `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &OrthographicCamera, viewport: (u32, u32)) {
        if !self.enable_pan {
            return;
        }
        let (right, up, _) = camera.basis();
        let width = viewport.0.max(1) as f32;
        let height = viewport.1.max(1) as f32;
        let left_distance = dx * self.pan_speed * camera.frustum.width() / camera.zoom / width;
        let up_distance = dy * self.pan_speed * camera.frustum.height() / camera.zoom / height;
        self.pan_offset += right * -left_distance;
        self.pan_offset += up * up_distance;
    }

    /// Positive amounts zoom in, negative amounts zoom out.
    pub fn dolly_by(&mut self, amount: f32) {
        if !self.enable_zoom || amount == 0.0 {
            return;
        }
        let zoom_scale = 0.95_f32.powf(self.zoom_speed);
        if amount > 0.0 {
            self.scale *= zoom_scale;
        } else {
            self.scale /= zoom_scale;
        }
    }
}

/// Returns (radius, theta, phi) with theta around +Y from +Z and phi from +Y.
fn to_spherical(v: Vector3<f32>) -> (f32, f32, f32) {
    let radius = v.magnitude();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let theta = v.x.atan2(v.z);
    let phi = (v.y / radius).clamp(-1.0, 1.0).acos();
    (radius, theta, phi)
}

fn from_spherical(radius: f32, theta: f32, phi: f32) -> Vector3<f32> {
    let sin_phi_radius = phi.sin() * radius;
    Vector3::new(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}
