mod config;
mod frame;
mod program;
mod renderer;
mod watcher;

use self::frame::*;
use self::renderer::*;
use self::watcher::*;
use anyhow::Context;
use compute_raymarch_common::glam::{ivec2, vec2};
use compute_raymarch_common::{OrbitCamera, OrbitController};
use log::{error, info, trace};
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,compute_raymarch=info"),
    )
    .init();

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title(config::WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(config::WIDTH, config::HEIGHT))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut pixels = {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, &window);

        Pixels::new(config::WIDTH, config::HEIGHT, surface)
            .context("failed to create graphics context")
            .map(Some)?
    };

    let watcher = ShaderWatcher::spawn(
        ShaderPaths {
            compute: config::COMPUTE_SHADER.into(),
            vertex: config::VERTEX_SHADER.into(),
            fragment: config::FRAGMENT_SHADER.into(),
        },
        config::SHADER_POLL_INTERVAL,
    );

    let mut camera = OrbitCamera::new(
        config::CAMERA_YAW,
        config::CAMERA_PITCH,
        config::CAMERA_RADIUS,
        config::CAMERA_FOCUS,
    );

    let mut controller = OrbitController::new(config::CAMERA_SENSITIVITY);
    let mut renderer: Option<Renderer> = None;
    let mut frame = FrameLoop::default();
    let mut input = WinitInputHelper::new();

    info!("Waiting for shaders");

    event_loop.run(move |event, _, control_flow| {
        if let (Some(sources), Some(pixels)) = (watcher.poll(), &pixels) {
            match &mut renderer {
                Some(renderer) => renderer.reload(pixels.device(), &sources),

                None => {
                    renderer = Some(Renderer::new(
                        pixels.device(),
                        pixels.render_texture_format(),
                        &sources,
                    ));
                }
            }
        }

        match &event {
            Event::WindowEvent {
                event: WindowEvent::CursorMoved { position, .. },
                ..
            } => {
                controller.pointer_moved(
                    &mut camera,
                    vec2(position.x as f32, position.y as f32),
                );
            }

            Event::WindowEvent {
                event: WindowEvent::CursorLeft { .. },
                ..
            } => {
                controller.reset();
            }

            Event::RedrawRequested(_) => {
                let Some(pixels) = &pixels else {
                    return;
                };

                let result = if let Some(renderer) = &renderer {
                    let params = camera.params(
                        config::LIGHT_POS,
                        ivec2(config::WIDTH as i32, config::HEIGHT as i32),
                    );

                    let result =
                        pixels.render_with(|encoder, target, context| {
                            renderer.update(&context.queue, &params);
                            renderer.render(encoder, target, &mut frame);

                            Ok(())
                        });

                    if frame.finish() {
                        trace!("Presented frame {}", frame.frames());
                    }

                    result
                } else {
                    pixels.render()
                };

                if let Err(err) = result {
                    error!("Dropped frame: {err}");
                }
            }

            Event::LoopDestroyed => {
                info!("Releasing GPU resources");

                drop(renderer.take());
                drop(pixels.take());
            }

            _ => {}
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape)
                || input.close_requested()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }

            window.request_redraw();
        }
    });
}
