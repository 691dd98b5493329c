#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Rustcaster.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use rustcaster_core::{MoveIntent, Viewport};
use rustcaster_rendering::{
    FrameInput, MinimapPresentation, Presentation, RenderingBackend, Scene, WallSlice,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` quits the game loop.
    quit_requested: bool,
    /// `Tab` toggles the debug overlay.
    toggle_debug: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape),
            toggle_debug: is_key_pressed(KeyCode::Tab),
        }
    }
}

/// Movement keys held down during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct MovementKeys {
    forward: bool,
    backward: bool,
    strafe_left: bool,
    strafe_right: bool,
    turn_left: bool,
    turn_right: bool,
}

impl MovementKeys {
    fn poll() -> Self {
        Self {
            forward: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            backward: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            strafe_left: is_key_down(KeyCode::Q),
            strafe_right: is_key_down(KeyCode::E),
            turn_left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            turn_right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window_dimension(scene.viewport.width()),
            window_height: window_dimension(scene.viewport.height()),
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input =
                    gather_frame_input_from_observations(MovementKeys::poll(), keyboard);

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation = simulation_start.elapsed();

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                let metrics = SceneMetrics::from_viewport(
                    scene.viewport,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                draw_walls(&scene.walls, &metrics);
                draw_minimap(&scene.minimap, &metrics);
                let render = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation,
                    render,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        tracing::info!(
                            fps = per_second,
                            trailing_fps = trailing_ten_seconds,
                            simulation_ms = avg_simulation.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timings"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn window_dimension(pixels: u32) -> i32 {
    i32::try_from(pixels).unwrap_or(i32::MAX)
}

/// Mapping from scene pixels to screen pixels, preserving the aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl SceneMetrics {
    fn from_viewport(viewport: Viewport, screen_width: f32, screen_height: f32) -> Self {
        let width = viewport.width() as f32;
        let height = viewport.height() as f32;
        let scale = if width <= f32::EPSILON || height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / width).min(screen_height / height)
        };

        Self {
            scale,
            offset_x: ((screen_width - width * scale) * 0.5).max(0.0),
            offset_y: ((screen_height - height * scale) * 0.5).max(0.0),
        }
    }

    fn to_screen(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + point.x * self.scale,
            self.offset_y + point.y * self.scale,
        )
    }
}

fn gather_frame_input_from_observations(
    keys: MovementKeys,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let axis = |positive: bool, negative: bool| {
        f32::from(u8::from(positive)) - f32::from(u8::from(negative))
    };

    FrameInput {
        intent: MoveIntent::new(
            axis(keys.forward, keys.backward),
            axis(keys.strafe_right, keys.strafe_left),
            axis(keys.turn_right, keys.turn_left),
        ),
        toggle_debug: keyboard.toggle_debug,
    }
}

fn draw_walls(walls: &[WallSlice], metrics: &SceneMetrics) {
    for slice in walls {
        let origin = metrics.to_screen(Vec2::new(slice.column as f32, slice.top));
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            metrics.scale,
            slice.height * metrics.scale,
            to_macroquad_color(slice.color),
        );
    }
}

fn draw_minimap(minimap: &MinimapPresentation, metrics: &SceneMetrics) {
    if let Some((extent, color)) = minimap.backdrop {
        let origin = metrics.to_screen(Vec2::ZERO);
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            extent.x * metrics.scale,
            extent.y * metrics.scale,
            to_macroquad_color(color),
        );
    }

    for block in &minimap.blocks {
        let origin = metrics.to_screen(block.origin);
        let size = block.size * metrics.scale;
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            size,
            size,
            to_macroquad_color(block.color),
        );
    }

    let player = metrics.to_screen(minimap.player);
    macroquad::shapes::draw_circle(
        player.x,
        player.y,
        minimap.player_radius * metrics.scale,
        to_macroquad_color(MinimapPresentation::PLAYER_COLOR),
    );

    let line_color = to_macroquad_color(MinimapPresentation::LINE_COLOR);
    for line in &minimap.lines {
        let from = metrics.to_screen(line.from);
        let to = metrics.to_screen(line.to);
        macroquad::shapes::draw_line(from.x, from.y, to.x, to.y, 1.0, line_color);
    }

    let point_color = to_macroquad_color(MinimapPresentation::POINT_COLOR);
    for point in &minimap.points {
        let center = metrics.to_screen(*point);
        macroquad::shapes::draw_circle(center.x, center.y, 1.5, point_color);
    }
}

fn to_macroquad_color(color: rustcaster_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
