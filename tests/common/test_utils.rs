#![allow(dead_code)]

use std::sync::{Mutex, OnceLock};

use cgmath::{Quaternion, Vector3};
use ortho_viewer::animation::{AnimationClip, Interpolation, Keyframes, Track};

/// Assembles a binary glTF file with all accessors in a single buffer.
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self {
            bin: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    fn view(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        let target = target.map(|t| format!(r#","target":{t}"#)).unwrap_or_default();
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{offset},"byteLength":{}{target}}}"#,
            bytes.len()
        ));
        self.views.len() - 1
    }

    fn floats(&mut self, data: &[f32], width: usize, ty: &str, target: Option<u32>) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|f| f.to_le_bytes()).collect();
        let view = self.view(&bytes, target);
        let mut min = vec![f32::INFINITY; width];
        let mut max = vec![f32::NEG_INFINITY; width];
        for element in data.chunks(width) {
            for (i, v) in element.iter().enumerate() {
                min[i] = min[i].min(*v);
                max[i] = max[i].max(*v);
            }
        }
        let list = |v: &[f32]| v.iter().map(|f| format!("{f:?}")).collect::<Vec<_>>().join(",");
        self.accessors.push(format!(
            concat!(
                r#"{{"bufferView":{view},"componentType":5126,"count":{},"type":"{ty}","#,
                r#""min":[{}],"max":[{}]}}"#
            ),
            data.len() / width,
            list(&min),
            list(&max),
            view = view,
            ty = ty
        ));
        self.accessors.len() - 1
    }

    pub fn scalars(&mut self, data: &[f32]) -> usize {
        self.floats(data, 1, "SCALAR", None)
    }

    pub fn positions(&mut self, data: &[[f32; 3]]) -> usize {
        self.floats(data.as_flattened(), 3, "VEC3", Some(34962))
    }

    pub fn vec3s(&mut self, data: &[[f32; 3]]) -> usize {
        self.floats(data.as_flattened(), 3, "VEC3", None)
    }

    pub fn vec4s(&mut self, data: &[[f32; 4]]) -> usize {
        self.floats(data.as_flattened(), 4, "VEC4", None)
    }

    pub fn indices(&mut self, data: &[u16]) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes, Some(34963));
        self.accessors.push(format!(
            r#"{{"bufferView":{view},"componentType":5123,"count":{},"type":"SCALAR"}}"#,
            data.len()
        ));
        self.accessors.len() - 1
    }

    /// `body` holds the remaining top level members, e.g. `"nodes":[..],"meshes":[..]`.
    pub fn build(mut self, body: &str) -> Vec<u8> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"buffers":[{{"byteLength":{}}}],"#,
                r#""bufferViews":[{}],"accessors":[{}],{}}}"#
            ),
            self.bin.len(),
            self.views.join(","),
            self.accessors.join(","),
            body
        )
        .into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + self.bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
        glb.extend_from_slice(&self.bin);
        glb
    }
}

/// Quaternion for a rotation of `degrees` around +Z, as glTF `[x, y, z, w]`.
pub fn z_rotation(degrees: f32) -> [f32; 4] {
    let half = degrees.to_radians() / 2.0;
    [0.0, 0.0, half.sin(), half.cos()]
}

/// A two node asset: a root translated by (1, 0, 0) holding a child scaled by
/// 2 with a single blended triangle, plus two clips animating the child.
pub fn sample_glb() -> Vec<u8> {
    let mut glb = GlbBuilder::new();
    let positions = glb.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let indices = glb.indices(&[0, 1, 2]);
    let idle_times = glb.scalars(&[0.0, 1.0]);
    let idle_values = glb.vec3s(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let wave_times = glb.scalars(&[0.0, 0.5]);
    let wave_values = glb.vec4s(&[z_rotation(0.0), z_rotation(90.0)]);
    glb.build(&format!(
        r#""scene":0,
        "scenes":[{{"nodes":[0]}}],
        "nodes":[
            {{"name":"root","translation":[1.0,0.0,0.0],"children":[1]}},
            {{"name":"leaf","mesh":0,"scale":[2.0,2.0,2.0]}}
        ],
        "meshes":[{{"name":"triangle","primitives":[
            {{"attributes":{{"POSITION":{positions}}},"indices":{indices},"material":0}}
        ]}}],
        "materials":[{{"name":"leaves","alphaMode":"BLEND","doubleSided":true}}],
        "animations":[
            {{"name":"idle","samplers":[{{"input":{idle_times},"output":{idle_values}}}],
              "channels":[{{"sampler":0,"target":{{"node":1,"path":"translation"}}}}]}},
            {{"name":"wave","samplers":[{{"input":{wave_times},"output":{wave_values}}}],
              "channels":[{{"sampler":0,"target":{{"node":1,"path":"rotation"}}}}]}}
        ]"#
    ))
}

/// A single unanimated triangle without a material.
pub fn static_glb() -> Vec<u8> {
    let mut glb = GlbBuilder::new();
    let positions = glb.positions(&[[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]]);
    glb.build(&format!(
        r#""scenes":[{{"nodes":[0]}}],
        "nodes":[{{"mesh":0}}],
        "meshes":[{{"primitives":[{{"attributes":{{"POSITION":{positions}}}}}]}}]"#
    ))
}

pub fn translation_track(node: usize, times: &[f32], values: &[[f32; 3]]) -> Track {
    Track::new(
        node,
        times.to_vec(),
        Keyframes::Translation(values.iter().map(|v| Vector3::from(*v)).collect()),
        Interpolation::Linear,
    )
}

pub fn rotation_track(node: usize, times: &[f32], values: &[[f32; 4]]) -> Track {
    Track::new(
        node,
        times.to_vec(),
        Keyframes::Rotation(values.iter().map(|v| Quaternion::from(*v)).collect()),
        Interpolation::Linear,
    )
}

pub fn scale_track(node: usize, times: &[f32], values: &[[f32; 3]]) -> Track {
    Track::new(
        node,
        times.to_vec(),
        Keyframes::Scale(values.iter().map(|v| Vector3::from(*v)).collect()),
        Interpolation::Linear,
    )
}

/// A clip moving `node` from the origin to (1, 0, 0) over one second.
pub fn clip(name: &str, node: usize) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![translation_track(node, &[0.0, 1.0], &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])],
    )
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

pub fn assert_vec_close(actual: Vector3<f32>, expected: [f32; 3]) {
    for i in 0..3 {
        assert!(
            (actual[i] - expected[i]).abs() < 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }
}

/// Quaternions q and -q are the same rotation.
pub fn assert_quat_close(actual: Quaternion<f32>, expected: [f32; 4]) {
    let expected = Quaternion::from(expected);
    let dot = actual.s * expected.s
        + actual.v.x * expected.v.x
        + actual.v.y * expected.v.y
        + actual.v.z * expected.v.z;
    assert!(
        (dot.abs() - 1.0).abs() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

/// Records every log line so tests can count what was reported.
pub struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

impl CapturingLogger {
    /// Installs the logger once per test binary and returns it.
    pub fn install() -> &'static CapturingLogger {
        static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();
        let logger = LOGGER.get_or_init(|| CapturingLogger {
            records: Mutex::new(Vec::new()),
        });
        if log::set_logger(logger).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
        logger
    }

    pub fn errors(&self) -> Vec<String> {
        self.at_level(log::Level::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.at_level(log::Level::Warn)
    }

    fn at_level(&self, wanted: log::Level) -> Vec<String> {
        self.records
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|(level, _)| *level == wanted)
                    .map(|(_, msg)| msg.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
