use crate::config;
use crate::frame::{FrameLoop, FrameStage};
use crate::program::{
    self, ComputeProgram, RenderProgram, ShaderSources, StageModule,
};
use compute_raymarch_common::{Params, QuadVertex, QUAD_VERTICES};
use log::{error, info};
use pixels::wgpu;
use pixels::wgpu::util::DeviceExt;
use std::borrow::Cow;
use std::mem;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

#[derive(Debug)]
struct ComputePass {
    pipeline: wgpu::ComputePipeline,
    workgroups: [u32; 3],
}

/// Owns every GPU resource of the demo.
///
/// Fields are dropped top to bottom, which is the reverse of the order they
/// are created in.
#[derive(Debug)]
pub struct Renderer {
    compute: Option<ComputePass>,
    render: Option<wgpu::RenderPipeline>,
    render_pipeline_layout: wgpu::PipelineLayout,
    compute_pipeline_layout: wgpu::PipelineLayout,
    render_bind_group: wgpu::BindGroup,
    compute_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    target_format: wgpu::TextureFormat,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        sources: &ShaderSources,
    ) -> Self {
        let image = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("renderer_image"),
            size: wgpu::Extent3d {
                width: config::WIDTH,
                height: config::HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config::IMAGE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let image_view = image.create_view(&Default::default());

        let quad_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("renderer_quad_buffer"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let params_buffer =
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("renderer_params_buffer"),
                size: mem::size_of::<Params>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("renderer_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("renderer_compute_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: config::IMAGE_FORMAT,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let render_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("renderer_render_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float {
                                filterable: true,
                            },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(
                            wgpu::SamplerBindingType::Filtering,
                        ),
                        count: None,
                    },
                ],
            });

        let compute_bind_group = device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                label: Some("renderer_compute_bind_group"),
                layout: &compute_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            &image_view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            },
        );

        let render_bind_group = device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                label: Some("renderer_render_bind_group"),
                layout: &render_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            &image_view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            },
        );

        let compute_pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("renderer_compute_pipeline_layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            },
        );

        let render_pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("renderer_render_pipeline_layout"),
                bind_group_layouts: &[&render_bind_group_layout],
                push_constant_ranges: &[],
            },
        );

        let mut this = Self {
            compute: None,
            render: None,
            render_pipeline_layout,
            compute_pipeline_layout,
            render_bind_group,
            compute_bind_group,
            params_buffer,
            quad_buffer,
            target_format,
        };

        this.reload(device, sources);
        this
    }

    /// Rebuilds both programs from `sources`; a program that fails to build
    /// leaves its stage disabled until the next reload.
    pub fn reload(
        &mut self,
        device: &wgpu::Device,
        sources: &ShaderSources,
    ) {
        self.compute = program::build_compute_program(&sources.compute)
            .and_then(|program| self.create_compute(device, &program));

        self.render = program::build_render_program(
            &sources.vertex,
            &sources.fragment,
        )
        .and_then(|program| self.create_render(device, &program));

        info!(
            "Pipelines ready: compute={}, render={}",
            self.compute.is_some(),
            self.render.is_some(),
        );
    }

    pub fn update(&self, queue: &wgpu::Queue, params: &Params) {
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(params),
        );
    }

    /// Records one frame: compute, barrier, render. Presenting is left to
    /// the caller, which submits `encoder`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        frame: &mut FrameLoop,
    ) {
        frame.enter(FrameStage::Compute);

        if let Some(compute) = &self.compute {
            let [x, y, z] = compute.workgroups;

            let mut pass = encoder.begin_compute_pass(
                &wgpu::ComputePassDescriptor {
                    label: Some("renderer_compute_pass"),
                },
            );

            pass.set_pipeline(&compute.pipeline);
            pass.set_bind_group(0, &self.compute_bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }

        // The compute pass is closed at this point; wgpu makes the image
        // writes visible before the next pass samples it.
        frame.enter(FrameStage::Barrier);
        frame.enter(FrameStage::Render);

        {
            let mut pass = encoder.begin_render_pass(
                &wgpu::RenderPassDescriptor {
                    label: Some("renderer_render_pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: target,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(
                                    wgpu::Color::BLACK,
                                ),
                                store: true,
                            },
                        },
                    )],
                    depth_stencil_attachment: None,
                },
            );

            if let Some(pipeline) = &self.render {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.render_bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
            }
        }

        frame.enter(FrameStage::Present);
    }

    fn create_compute(
        &self,
        device: &wgpu::Device,
        program: &ComputeProgram,
    ) -> Option<ComputePass> {
        let pipeline = validated(device, &program.shader.label, || {
            let module = shader_module(device, &program.shader);

            device.create_compute_pipeline(
                &wgpu::ComputePipelineDescriptor {
                    label: Some("renderer_compute_pipeline"),
                    layout: Some(&self.compute_pipeline_layout),
                    module: &module,
                    entry_point: &program.shader.entry_point,
                },
            )
        })?;

        Some(ComputePass {
            pipeline,
            workgroups: program.workgroups(config::WIDTH, config::HEIGHT),
        })
    }

    fn create_render(
        &self,
        device: &wgpu::Device,
        program: &RenderProgram,
    ) -> Option<wgpu::RenderPipeline> {
        validated(device, &program.fragment.label, || {
            let vertex = shader_module(device, &program.vertex);
            let fragment = shader_module(device, &program.fragment);

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("renderer_render_pipeline"),
                layout: Some(&self.render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: &program.vertex.entry_point,
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: mem::size_of::<QuadVertex>()
                            as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &QUAD_ATTRIBUTES,
                    }],
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: &program.fragment.entry_point,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            })
        })
    }
}

fn shader_module(
    device: &wgpu::Device,
    shader: &StageModule,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&shader.label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&shader.source)),
    })
}

/// Runs `create` inside a validation error scope, so that a rejected
/// pipeline is reported instead of tripping the device's error handler.
fn validated<T>(
    device: &wgpu::Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> Option<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = create();

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        error!("GPU rejected `{label}`: {err}");
        return None;
    }

    Some(value)
}
