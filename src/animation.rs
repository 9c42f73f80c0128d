//! Animation engine: cancellable visual programs over a display surface.
//!
//! Each animation runs on its own thread and is the only writer of pixel
//! data for its lifetime. Launching hands back an [`AnimationHandle`]
//! holding a stop flag and the join handle; [`AnimationHandle::stop`] sets
//! the flag and joins, so the caller knows the loop has fully exited before
//! it starts the next animation. Loops check the flag between phases, which
//! bounds cancellation latency to one sleep interval.
//!
//! Animation errors never reach the caller: a failed surface write is fatal
//! to the process (`surface::present`), everything else is impossible by
//! construction since coordinates are derived from `dimensions()`.

use crate::color::Color;
use crate::surface::{self, SharedSurface};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_BRIGHTNESS: f32 = 0.5;
pub const DEFAULT_RAINBOW_SPEED: f32 = 0.01;

const RAINBOW_PHASE_STEP: f32 = 0.3;
const RAINBOW_OFFSET: f32 = 30.0;

const COUNTDOWN_PULSE: Color = Color::new(255, 255, 0);
const COUNTDOWN_FINALE: Color = Color::new(255, 0, 0);
const COUNTDOWN_FINALE_BLINKS: u32 = 10;

/// One visual program. Immutable once launched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationSpec {
    /// Fill, present once, exit; the surface stays lit.
    Solid { color: Color, brightness: f32 },
    /// Alternate color and dark, `period` seconds per phase, until stopped.
    Blink {
        color: Color,
        brightness: f32,
        period: f32,
    },
    /// Procedural color field, one frame every `speed` seconds, until stopped.
    Rainbow { brightness: f32, speed: f32 },
    /// Dimming-yellow pulse for `total_seconds - 12`, then a red finale.
    /// Runs to completion in normal use.
    Countdown { total_seconds: u32 },
}

/// A launched animation: cooperative stop flag plus the join handle.
pub struct AnimationHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl AnimationHandle {
    /// Run `spec` against `surface` on a dedicated thread.
    pub fn launch(spec: AnimationSpec, surface: SharedSurface) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let thread = thread::spawn(move || run(spec, &surface, &flag));
        Self { stop, thread }
    }

    /// Signal the loop and block until it has fully exited.
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.thread.join().is_err() {
            tracing::error!("animation thread panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

fn run(spec: AnimationSpec, surface: &SharedSurface, stop: &AtomicBool) {
    match spec {
        AnimationSpec::Solid { color, brightness } => solid(surface, color, brightness),
        AnimationSpec::Blink {
            color,
            brightness,
            period,
        } => blink(surface, color, brightness, period, stop),
        AnimationSpec::Rainbow { brightness, speed } => rainbow(surface, brightness, speed, stop),
        AnimationSpec::Countdown { total_seconds } => countdown(surface, total_seconds, stop),
    }
}

fn stopped(stop: &AtomicBool) -> bool {
    stop.load(Ordering::SeqCst)
}

fn sleep_secs(seconds: f32) {
    thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
}

fn solid(surface: &SharedSurface, color: Color, brightness: f32) {
    let mut surface = surface.lock().unwrap();
    surface.set_brightness(brightness);
    surface.set_all(color);
    surface::present(&mut **surface);
}

fn blink(surface: &SharedSurface, color: Color, brightness: f32, period: f32, stop: &AtomicBool) {
    surface.lock().unwrap().clear();
    while !stopped(stop) {
        {
            let mut surface = surface.lock().unwrap();
            surface.set_brightness(brightness);
            surface.set_all(color);
            surface::present(&mut **surface);
        }
        sleep_secs(period);
        // checked between phases so a stop lands within one period
        if stopped(stop) {
            break;
        }
        {
            let mut surface = surface.lock().unwrap();
            surface.clear();
            surface::present(&mut **surface);
        }
        sleep_secs(period);
    }
}

/// Per-pixel color of the procedural rainbow field at phase `i`.
fn rainbow_color(x: u32, y: u32, i: f32) -> Color {
    let x = x as f32;
    let y = y as f32;
    let r = ((x + i) / 2.0).cos() + ((y + i) / 2.0).cos();
    let g = ((x + i) / 1.5).sin() + ((y + i) / 2.0).sin();
    let b = ((x + i) / 2.0).sin() + ((y + i) / 1.5).cos();
    Color::new(channel(r), channel(g), channel(b))
}

fn channel(wave: f32) -> u8 {
    (wave * 64.0 + 128.0 + RAINBOW_OFFSET).clamp(0.0, 255.0) as u8
}

fn rainbow(surface: &SharedSurface, brightness: f32, speed: f32, stop: &AtomicBool) {
    let mut i = 0.0f32;
    while !stopped(stop) {
        i += RAINBOW_PHASE_STEP;
        {
            let mut surface = surface.lock().unwrap();
            surface.set_brightness(brightness);
            let (width, height) = surface.dimensions();
            for x in 0..width {
                for y in 0..height {
                    surface.set_pixel(x, y, rainbow_color(x, y, i));
                }
            }
            surface::present(&mut **surface);
        }
        sleep_secs(speed);
    }
}

/// Sub-flash brightness levels for one countdown pulse tick. The decrement
/// can go below zero; levels are clamped at 0.0 instead of handing the
/// surface a negative brightness.
fn pulse_levels(base: f32) -> [f32; 4] {
    let mut levels = [0.0; 4];
    let mut b = base;
    for (step, level) in levels.iter_mut().enumerate() {
        b = (b - step as f32).max(0.0);
        *level = b;
    }
    levels
}

fn countdown(surface: &SharedSurface, total_seconds: u32, stop: &AtomicBool) {
    let mut remaining = i64::from(total_seconds) - 12;
    while remaining > 0 && !stopped(stop) {
        for level in pulse_levels(DEFAULT_BRIGHTNESS) {
            if stopped(stop) {
                return;
            }
            {
                let mut surface = surface.lock().unwrap();
                surface.set_brightness(level);
                surface.set_all(COUNTDOWN_PULSE);
                surface::present(&mut **surface);
            }
            sleep_secs(0.5);
            surface.lock().unwrap().clear();
        }
        {
            let mut surface = surface.lock().unwrap();
            surface::present(&mut **surface);
        }
        sleep_secs(2.0);
        remaining -= 2;
    }

    for _ in 0..COUNTDOWN_FINALE_BLINKS {
        if stopped(stop) {
            return;
        }
        {
            let mut surface = surface.lock().unwrap();
            surface.set_brightness(DEFAULT_BRIGHTNESS);
            surface.set_all(COUNTDOWN_FINALE);
        }
        half_blink(surface);
    }
    solid(surface, COUNTDOWN_FINALE, DEFAULT_BRIGHTNESS);
    half_blink(surface);

    surface::power_down(&mut **surface.lock().unwrap());
}

/// 0.8 s on, 0.2 s off.
fn half_blink(surface: &SharedSurface) {
    {
        let mut surface = surface.lock().unwrap();
        surface::present(&mut **surface);
    }
    sleep_secs(0.8);
    {
        let mut surface = surface.lock().unwrap();
        surface.clear();
        surface::present(&mut **surface);
    }
    sleep_secs(0.2);
}
