//! Orthographic camera and its GPU uniform.
//!
//! The frustum bounds are derived from the window aspect ratio, a fixed base
//! height and a fixed zoom factor (see [`OrthoFrustum`]). On top of that the
//! camera carries an interactive zoom driven by the orbit controls which
//! shrinks or grows the visible extents when the projection is rebuilt.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::config::ViewerConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Orthographic frustum planes.
///
/// `left/right` are always `∓frustum_size * aspect / zoom_factor` and
/// `top/bottom` are `±frustum_size / zoom_factor`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoFrustum {
    pub frustum_size: f32,
    pub zoom_factor: f32,
    pub aspect: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoFrustum {
    pub fn new(
        frustum_size: f32,
        zoom_factor: f32,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let mut frustum = Self {
            frustum_size,
            zoom_factor,
            aspect: 1.0,
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            near,
            far,
        };
        frustum.resize(width, height);
        frustum
    }

    pub fn from_config(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self::new(
            config.frustum_size,
            config.zoom_factor,
            config.near,
            config.far,
            width,
            height,
        )
    }

    /// Recomputes the aspect ratio and all four side planes.
    ///
    /// Callers must not pass a zero height.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        let half_height = self.frustum_size / self.zoom_factor;
        let half_width = self.frustum_size * self.aspect / self.zoom_factor;
        self.left = -half_width;
        self.right = half_width;
        self.top = half_height;
        self.bottom = -half_height;
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

#[derive(Clone, Debug)]
pub struct OrthographicCamera {
    pub position: Point3<f32>,
    /// The point the camera looks at.
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Interactive zoom; 1.0 shows exactly the frustum.
    pub zoom: f32,
    pub frustum: OrthoFrustum,
    projection: Matrix4<f32>,
}

impl OrthographicCamera {
    pub fn new(frustum: OrthoFrustum) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            zoom: 1.0,
            frustum,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Rebuilds the cached projection from the frustum and zoom.
    ///
    /// Has to be called after any change to `frustum` or `zoom`.
    pub fn update_projection_matrix(&mut self) {
        let f = &self.frustum;
        let dx = (f.right - f.left) / (2.0 * self.zoom);
        let dy = (f.top - f.bottom) / (2.0 * self.zoom);
        let cx = (f.right + f.left) / 2.0;
        let cy = (f.top + f.bottom) / 2.0;
        self.projection = cgmath::ortho(cx - dx, cx + dx, cy - dy, cy + dy, f.near, f.far);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let (right, up, back) = self.basis();
        let eye = self.position.to_vec();
        #[rustfmt::skip]
        let view = Matrix4::new(
            right.x, up.x, back.x, 0.0,
            right.y, up.y, back.y, 0.0,
            right.z, up.z, back.z, 0.0,
            -right.dot(eye), -up.dot(eye), -back.dot(eye), 1.0,
        );
        view
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection * self.view_matrix()
    }

    /// Camera space axes in world coordinates: (right, up, back).
    ///
    /// Falls back to the world axes when the camera sits on its target or
    /// looks straight along `up`.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let back = self.position - self.target;
        if back.magnitude2() <= f32::EPSILON {
            return (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z());
        }
        let back = back.normalize();
        let right = self.up.cross(back);
        if right.magnitude2() <= f32::EPSILON {
            return (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z());
        }
        let right = right.normalize();
        let up = back.cross(right);
        (right, up, back)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrthographicCamera) {
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &OrthographicCamera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
