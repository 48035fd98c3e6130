//! Externally loaded FXAA shader program.
//!
//! The program is WGSL. It is parsed and validated with `naga` on load so the
//! post-process stage can resolve techniques and parameters by name, the same
//! way the program's authors named them, instead of hard-coding a byte layout.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::PipelineError;

/// Vertex entry point shared by both techniques.
pub const VERTEX_ENTRY: &str = "vs_fullscreen";

/// Parameter names exposed by the program.
pub mod param {
    pub const CONSOLE_OPT1: &str = "ConsoleOpt1";
    pub const CONSOLE_OPT2: &str = "ConsoleOpt2";
    pub const CONSOLE_EDGE_SHARPNESS: &str = "ConsoleEdgeSharpness";
    pub const CONSOLE_EDGE_THRESHOLD: &str = "ConsoleEdgeThreshold";
    pub const CONSOLE_EDGE_THRESHOLD_MIN: &str = "ConsoleEdgeThresholdMin";
    pub const QUALITY_SUBPIX: &str = "fxaaQualitySubpix";
    pub const QUALITY_EDGE_THRESHOLD: &str = "fxaaQualityEdgeThreshold";
    pub const QUALITY_EDGE_THRESHOLD_MIN: &str = "fxaaQualityEdgeThresholdMin";
    pub const INV_VIEWPORT_WIDTH: &str = "invViewportWidth";
    pub const INV_VIEWPORT_HEIGHT: &str = "invViewportHeight";
    pub const TEX_SCREEN: &str = "texScreen";
}

/// Named FXAA technique.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Technique {
    Console,
    Quality,
}

impl Technique {
    pub const fn name(self) -> &'static str {
        match self {
            Technique::Console => "console",
            Technique::Quality => "quality",
        }
    }

    /// Fragment entry point implementing the technique.
    pub const fn entry_point(self) -> &'static str {
        match self {
            Technique::Console => "fs_console",
            Technique::Quality => "fs_quality",
        }
    }
}

/// Shape of a uniform parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParamKind {
    F32,
    Vec4F32,
}

impl ParamKind {
    pub const fn size(self) -> u32 {
        match self {
            ParamKind::F32 => 4,
            ParamKind::Vec4F32 => 16,
        }
    }
}

/// Byte location of a named parameter inside the uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParamSlot {
    pub offset: u32,
    pub kind: ParamKind,
}

/// Reflected uniform block (`var<uniform>` of struct type).
#[derive(Debug, Clone)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Struct span in bytes.
    pub size: u32,
    members: HashMap<String, ParamSlot>,
}

/// Kind of a bindable resource global.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    Texture,
    Sampler,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResourceSlot {
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// Parsed, validated and reflected WGSL program.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    source: String,
    vertex_entries: Vec<String>,
    fragment_entries: Vec<String>,
    uniform: Option<UniformBlock>,
    resources: HashMap<String, ResourceSlot>,
    /// Image globals the post-process pass cannot bind, with their WGSL type.
    unsupported: HashMap<String, String>,
}

impl ShaderProgram {
    /// Parses, validates and reflects `source`.
    pub fn from_wgsl(label: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let source = source.into();

        let module = naga::front::wgsl::parse_str(&source)
            .map_err(|e| anyhow::anyhow!(e.emit_to_string(&source)))
            .with_context(|| format!("failed to parse shader program `{label}`"))?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| anyhow::anyhow!(e.emit_to_string(&source)))
        .with_context(|| format!("shader program `{label}` failed validation"))?;

        let mut vertex_entries = Vec::new();
        let mut fragment_entries = Vec::new();
        for ep in &module.entry_points {
            if ep.stage == naga::ShaderStage::Vertex {
                vertex_entries.push(ep.name.clone());
            } else if ep.stage == naga::ShaderStage::Fragment {
                fragment_entries.push(ep.name.clone());
            }
        }

        let mut uniform = None;
        let mut resources = HashMap::new();
        let mut unsupported = HashMap::new();

        for (_, var) in module.global_variables.iter() {
            let (Some(name), Some(binding)) = (var.name.as_deref(), var.binding.as_ref()) else {
                continue;
            };

            match (&var.space, &module.types[var.ty].inner) {
                (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
                    if uniform.is_some() {
                        log::debug!("{label}: ignoring extra uniform block `{name}`");
                        continue;
                    }
                    let mut slots = HashMap::new();
                    for m in members {
                        let Some(member_name) = m.name.as_deref() else { continue };
                        if let Some(kind) = param_kind(&module.types[m.ty].inner) {
                            slots.insert(member_name.to_string(), ParamSlot { offset: m.offset, kind });
                        }
                    }
                    uniform = Some(UniformBlock {
                        group: binding.group,
                        binding: binding.binding,
                        size: *span,
                        members: slots,
                    });
                }
                (naga::AddressSpace::Handle, naga::TypeInner::Image { dim, arrayed, class }) => {
                    match unsupported_image(*dim, *arrayed, class) {
                        None => {
                            resources.insert(
                                name.to_string(),
                                ResourceSlot { group: binding.group, binding: binding.binding, kind: ResourceKind::Texture },
                            );
                        }
                        Some(ty) => {
                            unsupported.insert(name.to_string(), ty);
                        }
                    }
                }
                (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
                    resources.insert(
                        name.to_string(),
                        ResourceSlot { group: binding.group, binding: binding.binding, kind: ResourceKind::Sampler },
                    );
                }
                _ => {}
            }
        }

        log::debug!(
            "shader program `{label}`: vertex={vertex_entries:?} fragment={fragment_entries:?} uniform_params={}",
            uniform.as_ref().map_or(0, |u| u.members.len())
        );

        Ok(Self {
            label,
            source,
            vertex_entries,
            fragment_entries,
            uniform,
            resources,
            unsupported,
        })
    }

    /// Reads and reflects a WGSL file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader program {}", path.display()))?;
        Self::from_wgsl(path.display().to_string(), source)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the vertex entry point used by every technique.
    pub fn vertex_entry(&self) -> Result<&str, PipelineError> {
        self.vertex_entries
            .iter()
            .find(|e| e.as_str() == VERTEX_ENTRY)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::binding(format!("vertex entry `{VERTEX_ENTRY}` not found")))
    }

    /// Resolves a technique to its fragment entry point.
    pub fn technique(&self, technique: Technique) -> Result<&str, PipelineError> {
        let entry = technique.entry_point();
        self.fragment_entries
            .iter()
            .find(|e| e.as_str() == entry)
            .map(String::as_str)
            .ok_or_else(|| {
                PipelineError::binding(format!(
                    "technique `{}` (entry `{entry}`) not found",
                    technique.name()
                ))
            })
    }

    pub fn has_technique(&self, technique: Technique) -> bool {
        self.technique(technique).is_ok()
    }

    pub fn uniform_block(&self) -> Result<&UniformBlock, PipelineError> {
        self.uniform
            .as_ref()
            .ok_or_else(|| PipelineError::binding("program declares no uniform block"))
    }

    /// Resolves a named uniform parameter.
    pub fn param(&self, name: &str) -> Result<ParamSlot, PipelineError> {
        self.uniform_block()?
            .members
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::binding(format!("parameter `{name}` not found")))
    }

    /// Resolves a named texture or sampler global.
    ///
    /// Textures must be `texture_2d<f32>`; any other image type is reported
    /// as a binding error.
    pub fn resource(&self, name: &str, kind: ResourceKind) -> Result<ResourceSlot, PipelineError> {
        if let Some(ty) = self.unsupported.get(name) {
            return Err(PipelineError::binding(format!(
                "`{name}` is a {ty}, expected texture_2d<f32>"
            )));
        }
        match self.resources.get(name) {
            Some(slot) if slot.kind == kind => Ok(*slot),
            Some(slot) => Err(PipelineError::binding(format!(
                "`{name}` is a {:?}, expected {kind:?}",
                slot.kind
            ))),
            None => Err(PipelineError::binding(format!("resource `{name}` not found"))),
        }
    }

    /// Returns the single filtering sampler declared by the program.
    pub fn sampler(&self) -> Result<ResourceSlot, PipelineError> {
        let mut samplers = self.resources.values().filter(|r| r.kind == ResourceKind::Sampler);
        match (samplers.next(), samplers.next()) {
            (Some(s), None) => Ok(*s),
            (None, _) => Err(PipelineError::binding("program declares no sampler")),
            (Some(_), Some(_)) => Err(PipelineError::binding("program declares more than one sampler")),
        }
    }
}

/// Describes an image type other than a single-sampled, non-arrayed
/// `texture_2d<f32>`.
fn unsupported_image(dim: naga::ImageDimension, arrayed: bool, class: &naga::ImageClass) -> Option<String> {
    let dim = match dim {
        naga::ImageDimension::D1 => "1d",
        naga::ImageDimension::D2 => "2d",
        naga::ImageDimension::D3 => "3d",
        naga::ImageDimension::Cube => "cube",
    };
    let array = if arrayed { "_array" } else { "" };
    match class {
        naga::ImageClass::Sampled { kind: naga::ScalarKind::Float, multi: false } if dim == "2d" && !arrayed => None,
        naga::ImageClass::Sampled { kind, multi } => {
            let ms = if *multi { "multisampled_" } else { "" };
            let scalar = match kind {
                naga::ScalarKind::Sint => "i32",
                naga::ScalarKind::Uint => "u32",
                _ => "f32",
            };
            Some(format!("texture_{ms}{dim}{array}<{scalar}>"))
        }
        naga::ImageClass::Depth { multi } => {
            let ms = if *multi { "multisampled_" } else { "" };
            Some(format!("texture_depth_{ms}{dim}{array}"))
        }
        naga::ImageClass::Storage { .. } => Some(format!("texture_storage_{dim}{array}")),
        naga::ImageClass::External => Some("texture_external".to_string()),
    }
}

fn param_kind(inner: &naga::TypeInner) -> Option<ParamKind> {
    match inner {
        naga::TypeInner::Scalar(s) if *s == naga::Scalar::F32 => Some(ParamKind::F32),
        naga::TypeInner::Vector { size: naga::VectorSize::Quad, scalar } if *scalar == naga::Scalar::F32 => {
            Some(ParamKind::Vec4F32)
        }
        _ => None,
    }
}

/// Reference program shipped with the viewer.
#[cfg(test)]
pub(crate) const REFERENCE_PROGRAM: &str = include_str!("../../../lumen-viewer/assets/fxaa.wgsl");
