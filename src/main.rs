// main.rs — window, event loop, pointer wiring and the egui status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use dot_globe::animation::GrabState;
use dot_globe::camera::{cursor_to_ndc, OrbitCamera};
use dot_globe::config::GlobeConfig;
use dot_globe::map;
use dot_globe::mesh::BASE_SPHERE_RADIUS;
use dot_globe::renderer::Renderer;
use dot_globe::routes::default_cities;
use dot_globe::scene::{GlobeScene, MapLoad};
use dot_globe::{GlobeError, Result};

use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{CursorIcon, WindowBuilder},
};

use std::path::PathBuf;
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const MASK_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = GlobeConfig::resolve(&args);

    if let Err(e) = run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[derive(Default)]
struct UiActions {
    open_mask: Option<PathBuf>,
    regenerate_routes: bool,
    exit: bool,
}

fn run(config: GlobeConfig) -> Result<()> {
    let cities = config
        .cities
        .clone()
        .unwrap_or_else(|| default_cities().to_vec());
    if cities.len() < 2 {
        return Err(GlobeError::TooFewCities(cities.len()));
    }

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Dot Globe")
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let mut camera = OrbitCamera::new(renderer.size.width, renderer.size.height);
    camera.auto_rotate = config.auto_rotate;

    let mut rng = match config.seed {
        Some(seed) => {
            log::info!("using seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let mut scene = GlobeScene::new(
        cities,
        config.route_settings(),
        config.animate_extrusion,
        Instant::now(),
    );

    // dots and routes wait for the mask decode
    let (tx, rx) = channel();
    let mut is_loading = true;
    start_load_mask(config.map_path.clone(), tx.clone());

    // pointer state
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    let mut left_pressed = false;
    let mut over_globe = false;
    let mut cursor_icon = CursorIcon::Default;

    // FPS
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(load) = rx.try_recv() {
            is_loading = false;
            if let Err(e) = scene.apply_map(load, &mut rng) {
                log::error!("{e}");
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                // a release must always reach the extrusion state machine
                let released = matches!(
                    event,
                    WindowEvent::MouseInput { state: ElementState::Released, .. }
                );
                if response.consumed && !released {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        camera.resize(new_size.width, new_size.height);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        camera.resize(new_inner_size.width, new_inner_size.height);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_mask_file() {
                                        is_loading = true;
                                        start_load_mask(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::R) => {
                                    if let Err(e) = scene.regenerate_routes(&mut rng) {
                                        log::error!("{e}");
                                    }
                                }
                                Some(VirtualKeyCode::Space) => {
                                    camera.auto_rotate = !camera.auto_rotate;
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                        let now = Instant::now();
                        left_pressed = state == ElementState::Pressed;
                        camera.set_dragging(left_pressed);
                        if left_pressed {
                            scene.pointer_down(now, over_globe);
                        } else {
                            scene.pointer_up(now);
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if left_pressed {
                            if let Some(last) = cursor {
                                let dx = (position.x - last.x) as f32;
                                let dy = (position.y - last.y) as f32;
                                camera.drag(dx, dy, renderer.size.height);
                            }
                        }
                        cursor = Some(position);

                        let ndc = cursor_to_ndc(
                            position.x,
                            position.y,
                            renderer.size.width,
                            renderer.size.height,
                        );
                        over_globe = camera.ray(ndc).hits_sphere(BASE_SPHERE_RADIUS);
                    }

                    WindowEvent::CursorLeft { .. } => {
                        over_globe = false;
                        cursor = None;
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_mask(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                scene.frame(now);
                camera.update();
                renderer.update_camera(&camera);
                renderer.sync_scene(&scene);

                let icon = if scene.extrusion.is_grabbing() {
                    CursorIcon::Grabbing
                } else if over_globe {
                    CursorIcon::Hand
                } else {
                    CursorIcon::Default
                };
                if icon != cursor_icon {
                    window.set_cursor_icon(icon);
                    cursor_icon = icon;
                }

                let mut actions = UiActions::default();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        &scene,
                        &mut camera.auto_rotate,
                        &mut show_fps,
                        &mut actions,
                        fps,
                        is_loading,
                    );
                });

                if let Some(path) = actions.open_mask {
                    is_loading = true;
                    start_load_mask(path, tx.clone());
                }
                if actions.regenerate_routes {
                    if let Err(e) = scene.regenerate_routes(&mut rng) {
                        log::error!("{e}");
                    }
                }
                if actions.exit {
                    *control_flow = ControlFlow::Exit;
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

fn pick_mask_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Map mask", &MASK_EXTENSIONS)
        .pick_file()
}

/// Decodes the mask off the event loop; the outcome arrives through `tx`.
fn start_load_mask(path: PathBuf, tx: Sender<MapLoad>) {
    thread::spawn(move || {
        log::info!("loading map mask {}", path.display());

        let load = match map::decode_mask(&path) {
            Ok(img) => MapLoad::Decoded(img),
            Err(e) => MapLoad::Failed(format!("{}: {}", path.display(), e)),
        };
        if tx.send(load).is_err() {
            log::warn!("event loop gone before map mask finished loading");
        }
    });
}

fn grab_label(state: GrabState) -> &'static str {
    match state {
        GrabState::Idle => "idle",
        GrabState::Pressed { .. } => "pressed",
        GrabState::PressedPastMinimum => "held",
        GrabState::ReleasedPendingMinimum { .. } => "releasing",
    }
}

fn draw_ui(
    ctx: &egui::Context,
    scene: &GlobeScene,
    auto_rotate: &mut bool,
    show_fps: &mut bool,
    actions: &mut UiActions,
    fps: f32,
    is_loading: bool,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open map mask…").clicked() {
                    ui.close_menu();
                    actions.open_mask = pick_mask_file();
                }
                if ui.button("Exit").clicked() {
                    actions.exit = true;
                }
            });

            ui.menu_button("View", |ui| {
                if ui.checkbox(auto_rotate, "Auto-rotate").clicked() {
                    ui.close_menu();
                }
                if ui.button("Regenerate routes").clicked() {
                    actions.regenerate_routes = true;
                    ui.close_menu();
                }
                ui.separator();
                if ui.checkbox(show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(egui::RichText::new("Loading map…").color(egui::Color32::YELLOW));
                ui.label("|");
            } else if let Some(reason) = scene.map_error() {
                ui.label(egui::RichText::new("No map dots").color(egui::Color32::LIGHT_RED))
                    .on_hover_text(reason);
                ui.label("open a 361x181 mask with O, File menu, drop, or --map <path>");
                ui.label("|");
            }

            ui.label(format!("Dots: {}", scene.dots.len()));
            ui.label("|");
            ui.label(format!("Routes: {}", scene.routes.len()));
            ui.label("|");
            ui.label(format!("Grab: {}", grab_label(scene.extrusion.state())));

            if *show_fps {
                ui.label("|");
                ui.label(egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN));
            }
        });
    });
}
