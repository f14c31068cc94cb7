use gpu_life::config::SimulationConfig;
use gpu_life::constants::FPS_UPDATE_INTERVAL_SECS;
use gpu_life::controls::{Command, MousePainter, command_for_key};
use gpu_life::error::{SimError, SimResult};
use gpu_life::gpu::GpuSubstrate;
use gpu_life::grid::{CellState, Grid};
use gpu_life::playback::PlaybackController;
use gpu_life::renderer::Palette;
use gpu_life::substrate::Substrate;
use glam::{UVec2, Vec2};
use std::{sync::Arc, time::Instant};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::PhysicalKey,
    window::WindowBuilder,
};

type Controller = PlaybackController<GpuSubstrate>;

fn apply_command(controller: &mut Controller, command: Command) -> SimResult<()> {
    match command {
        Command::PlayPause => controller.play_pause(),
        Command::StepForward => controller.step_forward()?,
        Command::Randomise => controller.randomise_state()?,
        Command::Reset => controller.reset_state()?,
        Command::FasterFps => {
            controller.adjust_fps(true)?;
        }
        Command::SlowerFps => {
            controller.adjust_fps(false)?;
        }
        // Handled by the event loop
        Command::Exit => {}
    }
    Ok(())
}

fn viewport_of(controller: &Controller) -> UVec2 {
    let size = controller.substrate().viewport();
    UVec2::new(size.width, size.height)
}

fn paint(controller: &mut Controller, cell: Option<(usize, usize)>) -> SimResult<()> {
    match cell {
        Some((x, y)) => controller.paint_cell(x, y, CellState::Alive),
        None => Ok(()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = SimulationConfig::load()?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("GPU Life")
            .with_inner_size(PhysicalSize::new(config.window_width, config.window_height))
            .build(&event_loop)?,
    );

    let palette = Palette {
        background: config.background_color,
        alive: config.alive_color,
    };
    let seed_grid = Grid::dead(config.cols, config.rows)?;
    let substrate = pollster::block_on(GpuSubstrate::new(
        window.clone(),
        &seed_grid,
        palette,
        config.gap_ratio,
    ))?;
    let mut controller = PlaybackController::from_config(substrate, &config)?;
    controller.randomise_state()?;

    let mut painter = MousePainter::new();
    let mut last_tick = Instant::now();
    let mut last_fps_update_time = Instant::now();
    let mut frames_since_last_fps_update = 0;
    let mut current_fps = 0.0;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        let result: SimResult<()> = match event {
            Event::AboutToWait => {
                window.request_redraw();
                Ok(())
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    elwt.exit();
                    Ok(())
                }
                WindowEvent::Resized(physical_size) => {
                    controller.resize_viewport(physical_size.width, physical_size.height);
                    Ok(())
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let new_inner_size = window.inner_size();
                    controller.resize_viewport(new_inner_size.width, new_inner_size.height);
                    Ok(())
                }
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => match key_event.physical_key {
                    PhysicalKey::Code(key)
                        if key_event.state == ElementState::Pressed && !key_event.repeat =>
                    {
                        match command_for_key(key) {
                            Some(Command::Exit) => {
                                elwt.exit();
                                Ok(())
                            }
                            Some(command) => apply_command(&mut controller, command),
                            None => Ok(()),
                        }
                    }
                    _ => Ok(()),
                },
                WindowEvent::CursorMoved { position, .. } => {
                    let viewport = viewport_of(&controller);
                    let grid = controller.substrate().dimensions();
                    let position = Vec2::new(position.x as f32, position.y as f32);
                    let cell = painter.cursor_moved(position, viewport, grid);
                    paint(&mut controller, cell)
                }
                WindowEvent::CursorLeft { .. } => {
                    painter.cursor_left();
                    Ok(())
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let viewport = viewport_of(&controller);
                    let grid = controller.substrate().dimensions();
                    let cell =
                        painter.button_changed(state == ElementState::Pressed, viewport, grid);
                    paint(&mut controller, cell)
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let elapsed = now.duration_since(last_tick);
                    last_tick = now;

                    frames_since_last_fps_update += 1;
                    let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
                    if elapsed_secs >= FPS_UPDATE_INTERVAL_SECS {
                        current_fps = frames_since_last_fps_update as f64 / elapsed_secs;
                        last_fps_update_time = now;
                        frames_since_last_fps_update = 0;
                    }

                    let ticked = controller.tick(elapsed).map(|_| ());
                    let paused_text = if controller.is_running() {
                        ""
                    } else {
                        " [PAUSED]"
                    };
                    window.set_title(&format!(
                        "GPU Life - Gen: {} - Rate: {:.2}/s - FPS: {:.1}{}",
                        controller.generation(),
                        controller.playback().fps(),
                        current_fps,
                        paused_text
                    ));
                    ticked
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(e @ SimError::DeviceUnavailable(_)) => {
                log::error!("{e}, shutting down");
                elwt.exit();
            }
            Err(e) => log::warn!("{e}"),
        }
    })?;
    Ok(())
}
