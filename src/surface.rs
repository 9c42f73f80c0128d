//! Display surface abstraction and the software mock backend.
//!
//! Every backend exposes the same capability set; the concrete backend is
//! chosen once at startup ([`detect`]) and is fixed for the process
//! lifetime. The currently running animation is the only writer of pixel
//! data (the controller enforces this by joining the previous animation
//! before starting the next).

use crate::color::{self, Color};
use crate::error::LightError;
use std::sync::{Arc, Mutex};

/// Mock grid dimensions, matching the full-size matrix.
const MOCK_WIDTH: u32 = 8;
const MOCK_HEIGHT: u32 = 4;

/// Handle shared between the controller and the running animation.
pub type SharedSurface = Arc<Mutex<Box<dyn DisplaySurface>>>;

pub fn shared(surface: Box<dyn DisplaySurface>) -> SharedSurface {
    Arc::new(Mutex::new(surface))
}

pub trait DisplaySurface: Send {
    /// Width and height in pixels, fixed after construction.
    fn dimensions(&self) -> (u32, u32);

    /// Out-of-range coordinates are a caller bug and fail fast; all callers
    /// derive x/y from `dimensions()`.
    fn set_pixel(&mut self, x: u32, y: u32, color: Color);

    fn set_all(&mut self, color: Color);

    /// Zero every pixel without presenting.
    fn clear(&mut self);

    /// Flush the pixel buffer to the output.
    fn show(&mut self) -> Result<(), LightError>;

    /// Global brightness, clamped to 0.0..=1.0, applied at present time.
    fn set_brightness(&mut self, value: f32);

    /// Valid rotations are 0/90/180/270. Unsupported values are ignored
    /// with a warning, never a crash.
    fn set_rotation(&mut self, degrees: u16);

    /// Clear and power the output down.
    fn off(&mut self) -> Result<(), LightError> {
        self.clear();
        self.show()
    }

    /// Backend identifier reported by the status API.
    fn kind(&self) -> &'static str;
}

/// Present the buffer. A failed write means the physical output is gone,
/// which this design treats as fatal.
pub(crate) fn present(surface: &mut dyn DisplaySurface) {
    if let Err(e) = surface.show() {
        tracing::error!("display write failed: {e}");
        std::process::exit(1);
    }
}

pub(crate) fn power_down(surface: &mut dyn DisplaySurface) {
    if let Err(e) = surface.off() {
        tracing::error!("display power-off failed: {e}");
        std::process::exit(1);
    }
}

/// Probe for attached hardware and return the matching backend.
///
/// `force` skips probing ("mock", "phat" or "mini"). Without the `hardware`
/// feature the mock is the only backend available.
pub fn detect(force: Option<&str>) -> Box<dyn DisplaySurface> {
    match force {
        Some("mock") => {}
        Some(name @ ("phat" | "mini")) => {
            #[cfg(feature = "hardware")]
            match crate::hardware::open(name) {
                Ok(surface) => return surface,
                Err(e) => tracing::warn!("failed to open {name} backend: {e}, using mock"),
            }
            #[cfg(not(feature = "hardware"))]
            tracing::warn!("hardware support not compiled in, ignoring --backend {name}");
        }
        Some(other) => tracing::warn!("unknown backend {other:?}, using mock"),
        None => {
            #[cfg(feature = "hardware")]
            match crate::hardware::probe() {
                Ok(surface) => return surface,
                Err(e) => tracing::warn!("hardware probe failed: {e}, using mock"),
            }
            #[cfg(not(feature = "hardware"))]
            tracing::info!("hardware support not compiled in, running with the mock display");
        }
    }
    Box::new(MockSurface::new(MOCK_WIDTH, MOCK_HEIGHT))
}

// ── Mock backend ─────────────────────────────────────────────────────

#[derive(Debug)]
struct MockState {
    brightness: f32,
    rotation: u16,
    pixels: Vec<Color>,
    presents: u64,
    powered_off: bool,
}

/// In-memory backend used when no HAT is attached, and in tests.
///
/// Cloning returns another handle onto the same pixel state, so a test can
/// keep one handle while the controller owns the boxed surface. Each present
/// logs a human-readable color summary for observability without hardware.
#[derive(Clone)]
pub struct MockSurface {
    width: u32,
    height: u32,
    state: Arc<Mutex<MockState>>,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Arc::new(Mutex::new(MockState {
                brightness: 0.5,
                rotation: 0,
                pixels: vec![color::BLACK; (width * height) as usize],
                presents: 0,
                powered_off: false,
            })),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        assert!(x < self.width && y < self.height);
        self.state.lock().unwrap().pixels[(y * self.width + x) as usize]
    }

    /// Number of completed `show()` calls.
    pub fn presents(&self) -> u64 {
        self.state.lock().unwrap().presents
    }

    pub fn brightness(&self) -> f32 {
        self.state.lock().unwrap().brightness
    }

    pub fn rotation(&self) -> u16 {
        self.state.lock().unwrap().rotation
    }

    pub fn is_powered_off(&self) -> bool {
        self.state.lock().unwrap().powered_off
    }

    pub fn is_dark(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .pixels
            .iter()
            .all(|c| *c == color::BLACK)
    }
}

impl DisplaySurface for MockSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) outside {}x{} surface",
            self.width,
            self.height
        );
        self.state.lock().unwrap().pixels[(y * self.width + x) as usize] = color;
    }

    fn set_all(&mut self, color: Color) {
        self.state.lock().unwrap().pixels.fill(color);
    }

    fn clear(&mut self) {
        self.state.lock().unwrap().pixels.fill(color::BLACK);
    }

    fn show(&mut self) -> Result<(), LightError> {
        let mut state = self.state.lock().unwrap();
        state.presents += 1;
        state.powered_off = false;

        let first = state.pixels[0];
        let name = color_name(first);
        // Status colors get a prominent line; animation frames stay quiet.
        match name {
            "GREEN (Available)" | "RED (Busy)" | "YELLOW (Away)" | "BLACK/OFF" => {
                tracing::info!(
                    "display: rgb({}, {}, {}) #{} {} at brightness {:.2}",
                    first.r,
                    first.g,
                    first.b,
                    first.to_hex(),
                    name,
                    state.brightness
                );
            }
            _ => tracing::trace!("display: #{} {}", first.to_hex(), name),
        }
        Ok(())
    }

    fn set_brightness(&mut self, value: f32) {
        self.state.lock().unwrap().brightness = value.clamp(0.0, 1.0);
    }

    fn set_rotation(&mut self, degrees: u16) {
        if matches!(degrees, 0 | 90 | 180 | 270) {
            self.state.lock().unwrap().rotation = degrees;
        } else {
            tracing::warn!("ignoring unsupported rotation {degrees}");
        }
    }

    fn off(&mut self) -> Result<(), LightError> {
        self.clear();
        self.show()?;
        self.state.lock().unwrap().powered_off = true;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}

/// Human-readable name for the mock's present log.
fn color_name(c: Color) -> &'static str {
    match (c.r, c.g, c.b) {
        (0, 0, 0) => "BLACK/OFF",
        (0, 144, 0) => "GREEN (Available)",
        (179, 0, 0) => "RED (Busy)",
        (255, 191, 0) => "YELLOW (Away)",
        (r, g, b) if r > 200 && g > 200 && b > 200 => "WHITE",
        (r, g, b) if r > g && r > b => "RED",
        (r, g, b) if g > r && g > b => "GREEN",
        (r, g, b) if b > r && b > g => "BLUE",
        (r, g, _) if r > 200 && g > 200 => "YELLOW",
        (r, _, b) if r > 200 && b > 200 => "MAGENTA",
        (_, g, b) if g > 200 && b > 200 => "CYAN",
        _ => "MIXED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn mock_dimensions_are_fixed() {
        let mock = MockSurface::new(8, 4);
        assert_eq!(mock.dimensions(), (8, 4));
    }

    #[test]
    fn set_all_fills_every_pixel() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_all(color::AVAILABLE);
        for x in 0..8 {
            for y in 0..4 {
                assert_eq!(mock.pixel(x, y), color::AVAILABLE);
            }
        }
    }

    #[test]
    fn clear_zeroes_without_presenting() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_all(color::BUSY);
        mock.clear();
        assert!(mock.is_dark());
        assert_eq!(mock.presents(), 0);
    }

    #[test]
    fn show_counts_presents() {
        let mut mock = MockSurface::new(8, 4);
        mock.show().unwrap();
        mock.show().unwrap();
        assert_eq!(mock.presents(), 2);
    }

    #[test]
    #[should_panic]
    fn set_pixel_out_of_range_fails_fast() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_pixel(8, 0, color::BUSY);
    }

    #[test]
    fn brightness_is_clamped() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_brightness(3.0);
        assert_eq!(mock.brightness(), 1.0);
        mock.set_brightness(-1.0);
        assert_eq!(mock.brightness(), 0.0);
    }

    #[rstest]
    #[case(0)]
    #[case(90)]
    #[case(180)]
    #[case(270)]
    fn rotation_accepts_quarter_turns(#[case] degrees: u16) {
        let mut mock = MockSurface::new(8, 4);
        mock.set_rotation(degrees);
        assert_eq!(mock.rotation(), degrees);
    }

    #[test]
    fn rotation_ignores_out_of_set_values() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_rotation(90);
        mock.set_rotation(45);
        assert_eq!(mock.rotation(), 90);
    }

    #[test]
    fn off_clears_and_powers_down() {
        let mut mock = MockSurface::new(8, 4);
        mock.set_all(color::AWAY);
        mock.off().unwrap();
        assert!(mock.is_dark());
        assert!(mock.is_powered_off());
        // a later show powers it back up
        mock.show().unwrap();
        assert!(!mock.is_powered_off());
    }

    #[rstest]
    #[case(Color::new(0, 0, 0), "BLACK/OFF")]
    #[case(Color::new(0, 144, 0), "GREEN (Available)")]
    #[case(Color::new(179, 0, 0), "RED (Busy)")]
    #[case(Color::new(255, 191, 0), "YELLOW (Away)")]
    #[case(Color::new(250, 250, 250), "WHITE")]
    #[case(Color::new(200, 10, 10), "RED")]
    #[case(Color::new(10, 200, 10), "GREEN")]
    #[case(Color::new(10, 10, 200), "BLUE")]
    fn test_color_name(#[case] color: Color, #[case] expected: &str) {
        assert_eq!(color_name(color), expected);
    }

    #[test]
    fn detect_falls_back_to_mock() {
        let surface = detect(Some("mock"));
        assert_eq!(surface.kind(), "mock");
        let surface = detect(Some("nonsense"));
        assert_eq!(surface.kind(), "mock");
    }
}
