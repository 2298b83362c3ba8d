use log::{error, info};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::collections::BTreeMap;
use std::path::Path;
use std::{fmt, fs};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Compute,
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Compute => naga::ShaderStage::Compute,
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Compute => write!(f, "compute"),
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("couldn't compile `{label}`:\n{diagnostic}")]
    Compile { label: String, diagnostic: String },

    #[error("`{label}` has no {stage} entry point")]
    MissingEntryPoint { label: String, stage: ShaderStage },

    #[error("couldn't link `{vertex}` with `{fragment}`: {reason}")]
    Link {
        vertex: String,
        fragment: String,
        reason: String,
    },
}

/// Source text of a single stage, labelled by where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageSource {
    pub label: String,
    pub text: String,
}

impl StageSource {
    /// Reads the source; an unreadable file is logged and yields empty text.
    pub fn load(path: &Path) -> Self {
        let text = fs::read_to_string(path).unwrap_or_else(|err| {
            error!("Couldn't read shader `{}`: {err}", path.display());
            String::new()
        });

        Self {
            label: path.display().to_string(),
            text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub compute: StageSource,
    pub vertex: StageSource,
    pub fragment: StageSource,
}

/// Compiled and validated stage, ready to be handed to the GPU.
#[derive(Debug)]
pub struct StageModule {
    pub label: String,
    pub stage: ShaderStage,
    pub entry_point: String,
    pub source: String,
    module: naga::Module,
}

impl StageModule {
    fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }
}

#[derive(Debug)]
pub struct ComputeProgram {
    pub shader: StageModule,
    pub workgroup_size: [u32; 3],
}

impl ComputeProgram {
    /// Number of workgroups needed to cover a `width` x `height` image.
    pub fn workgroups(&self, width: u32, height: u32) -> [u32; 3] {
        let [x, y, _] = self.workgroup_size;

        [width.div_ceil(x), height.div_ceil(y), 1]
    }
}

#[derive(Debug)]
pub struct RenderProgram {
    pub vertex: StageModule,
    pub fragment: StageModule,
}

/// Vertex attributes provided by the quad: `@location(0)` position and
/// `@location(1)` texture coordinates, both `vec2<f32>`.
const QUAD_LOCATIONS: [u32; 2] = [0, 1];

const VEC2_F32: naga::TypeInner = naga::TypeInner::Vector {
    size: naga::VectorSize::Bi,
    kind: naga::ScalarKind::Float,
    width: 4,
};

pub fn compile_stage(
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<StageModule, ShaderError> {
    let compile_error = |diagnostic| ShaderError::Compile {
        label: label.to_owned(),
        diagnostic,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| compile_error(err.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| compile_error(err.emit_to_string(source)))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.to_naga())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            label: label.to_owned(),
            stage,
        })?;

    Ok(StageModule {
        label: label.to_owned(),
        stage,
        entry_point,
        source: source.to_owned(),
        module,
    })
}

pub fn link_compute(
    shader: StageModule,
) -> Result<ComputeProgram, ShaderError> {
    let workgroup_size = shader
        .entry()
        .filter(|ep| ep.stage == naga::ShaderStage::Compute)
        .map(|ep| ep.workgroup_size)
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            label: shader.label.clone(),
            stage: ShaderStage::Compute,
        })?;

    Ok(ComputeProgram {
        shader,
        workgroup_size,
    })
}

/// Checks that the vertex stage consumes only what the quad provides and
/// that every fragment input is produced by the vertex stage.
pub fn link_render(
    vertex: StageModule,
    fragment: StageModule,
) -> Result<RenderProgram, ShaderError> {
    let link_error = |reason: String| ShaderError::Link {
        vertex: vertex.label.clone(),
        fragment: fragment.label.clone(),
        reason,
    };

    let (Some(vs), Some(fs)) = (vertex.entry(), fragment.entry()) else {
        return Err(link_error("missing entry point".into()));
    };

    if vs.stage != naga::ShaderStage::Vertex
        || fs.stage != naga::ShaderStage::Fragment
    {
        return Err(link_error(format!(
            "expected vertex + fragment, got {:?} + {:?}",
            vs.stage, fs.stage
        )));
    }

    for (location, ty) in inputs(&vertex.module, vs) {
        if !QUAD_LOCATIONS.contains(&location) {
            return Err(link_error(format!(
                "vertex input @location({location}) is not provided by the quad"
            )));
        }

        if ty != VEC2_F32 {
            return Err(link_error(format!(
                "vertex input @location({location}) must be vec2<f32>, got {ty:?}"
            )));
        }
    }

    let produced = outputs(&vertex.module, vs);

    for (location, ty) in inputs(&fragment.module, fs) {
        match produced.get(&location) {
            Some(out) if *out == ty => {}

            Some(out) => {
                return Err(link_error(format!(
                    "@location({location}) is {out:?} in the vertex stage, \
                     but {ty:?} in the fragment stage"
                )));
            }

            None => {
                return Err(link_error(format!(
                    "fragment input @location({location}) is not written \
                     by the vertex stage"
                )));
            }
        }
    }

    Ok(RenderProgram { vertex, fragment })
}

/// Compiles and links the compute stage; failures are logged and yield
/// `None`.
pub fn build_compute_program(
    source: &StageSource,
) -> Option<ComputeProgram> {
    let program = report(
        compile_stage(ShaderStage::Compute, &source.label, &source.text)
            .and_then(link_compute),
    )?;

    info!(
        "Compiled compute program `{}` (workgroup size {:?})",
        program.shader.label, program.workgroup_size
    );

    Some(program)
}

/// Compiles both stages and links them; failures are logged and yield
/// `None`.
pub fn build_render_program(
    vertex: &StageSource,
    fragment: &StageSource,
) -> Option<RenderProgram> {
    let vertex = report(compile_stage(
        ShaderStage::Vertex,
        &vertex.label,
        &vertex.text,
    ));

    let fragment = report(compile_stage(
        ShaderStage::Fragment,
        &fragment.label,
        &fragment.text,
    ));

    let program = report(link_render(vertex?, fragment?))?;

    info!(
        "Linked render program `{}` + `{}`",
        program.vertex.label, program.fragment.label
    );

    Some(program)
}

fn report<T>(result: Result<T, ShaderError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("{err}");
            None
        }
    }
}

fn inputs(
    module: &naga::Module,
    ep: &naga::EntryPoint,
) -> BTreeMap<u32, naga::TypeInner> {
    let mut out = BTreeMap::new();

    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }

    out
}

fn outputs(
    module: &naga::Module,
    ep: &naga::EntryPoint,
) -> BTreeMap<u32, naga::TypeInner> {
    let mut out = BTreeMap::new();

    if let Some(result) = &ep.function.result {
        collect_locations(
            module,
            result.ty,
            result.binding.as_ref(),
            &mut out,
        );
    }

    out
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeMap<u32, naga::TypeInner>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }

        Some(naga::Binding::BuiltIn(_)) => {}

        // Interface structs carry their bindings on the members
        None => {
            if let naga::TypeInner::Struct { members, .. } =
                &module.types[ty].inner
            {
                for member in members {
                    collect_locations(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}
