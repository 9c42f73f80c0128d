//! Status controller: owns the presence state and arbitrates animations.
//!
//! All mutation funnels through one inner mutex, so state changes are
//! totally ordered. Every change stops and joins the previous animation
//! before launching the next one, which keeps a single writer on the
//! display surface at all times — two animations never interleave frames.

use crate::animation::{self, AnimationHandle, AnimationSpec};
use crate::color::{self, Color};
use crate::sensor::CpuTempSensor;
use crate::surface::{self, SharedSurface};
use crate::webhook::Notifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use utoipa::ToSchema;

/// Semantic presence state shown on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub enum Status {
    Off,
    Available,
    Busy,
    Away,
    Rainbow,
    /// An arbitrary RGB triple that matches no canonical status.
    Unknown,
}

impl Status {
    /// Canonical RGB triple for the named statuses.
    pub fn canonical_rgb(self) -> Option<Color> {
        match self {
            Status::Available => Some(color::AVAILABLE),
            Status::Busy => Some(color::BUSY),
            Status::Away => Some(color::AWAY),
            _ => None,
        }
    }

    /// Classify an RGB triple against the canonical table.
    pub fn classify(color: Color) -> Self {
        [Status::Available, Status::Busy, Status::Away]
            .into_iter()
            .find(|status| status.canonical_rgb() == Some(color))
            .unwrap_or(Status::Unknown)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The controller's view of the light. The controller is the only writer.
#[derive(Clone, Debug)]
pub struct ControllerState {
    pub color: Color,
    pub brightness: f32,
    pub status: Status,
    /// While set, only pinned calls or an explicit reset may change status.
    pub pinned: bool,
    pub last_called: Option<DateTime<Utc>>,
    pub last_called_api: Option<&'static str>,
}

/// Read-only state copy plus live readings, serialized by `/api/status`.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub brightness: f32,
    pub last_called: Option<DateTime<Utc>>,
    pub cpu_temp: f32,
    pub last_called_api: Option<String>,
    pub height: u32,
    pub width: u32,
    pub unicorn: String,
    pub status: Status,
    pub status_overwritten: bool,
}

struct Inner {
    state: ControllerState,
    animation: Option<AnimationHandle>,
}

pub struct StatusController {
    surface: SharedSurface,
    inner: Mutex<Inner>,
    notifier: Arc<dyn Notifier>,
    sensor: CpuTempSensor,
}

impl StatusController {
    pub fn new(surface: SharedSurface, notifier: Arc<dyn Notifier>, sensor: CpuTempSensor) -> Self {
        Self {
            surface,
            inner: Mutex::new(Inner {
                state: ControllerState {
                    color: color::BLACK,
                    brightness: 0.0,
                    status: Status::Off,
                    pinned: false,
                    last_called: None,
                    last_called_api: None,
                },
                animation: None,
            }),
            notifier,
            sensor,
        }
    }

    /// Change the shown color. A pinned controller ignores non-pinning
    /// requests until [`StatusController::reset`]. Blocks until the previous
    /// animation has fully exited before the new one starts. Pinned calls
    /// are the dedicated status operations, so they notify the webhook for
    /// the derived status.
    pub fn set_status(
        &self,
        color: Color,
        brightness: Option<f32>,
        speed: Option<f32>,
        pin: bool,
        endpoint: &'static str,
    ) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.pinned && !pin {
            tracing::debug!("status is pinned, ignoring {endpoint}");
            return;
        }
        self.apply(&mut inner, color, brightness, speed, pin, endpoint);
    }

    /// Switch to a random full-saturation hue, overriding any pin.
    pub fn switch_on(&self, endpoint: &'static str) {
        use rand::Rng;
        let hue = rand::rng().random_range(0..360u16);
        let color = Color::from_hsv(hue, 100, 100);

        let mut inner = self.inner.lock().unwrap();
        inner.state.pinned = false;
        self.apply(&mut inner, color, None, None, false, endpoint);
    }

    /// Stop whatever is running and start the rainbow. Always unpins.
    pub fn set_rainbow(&self, brightness: Option<f32>, speed: Option<f32>, endpoint: &'static str) {
        let mut inner = self.inner.lock().unwrap();
        Self::stop_animation(&mut inner);

        let brightness = brightness.unwrap_or(animation::DEFAULT_BRIGHTNESS);
        let speed = positive(speed).unwrap_or(animation::DEFAULT_RAINBOW_SPEED);

        inner.state.color = color::BLACK;
        inner.state.brightness = brightness;
        inner.state.status = Status::Rainbow;
        inner.state.pinned = false;
        Self::stamp(&mut inner.state, endpoint);

        inner.animation = Some(AnimationHandle::launch(
            AnimationSpec::Rainbow { brightness, speed },
            self.surface.clone(),
        ));
        self.notifier.notify(Status::Rainbow);
    }

    /// Stop the animation, clear and power down the display. Idempotent.
    pub fn switch_off(&self, endpoint: &'static str) {
        let mut inner = self.inner.lock().unwrap();
        Self::stop_animation(&mut inner);

        inner.state.color = color::BLACK;
        inner.state.status = Status::Off;
        inner.state.pinned = false;
        Self::stamp(&mut inner.state, endpoint);

        surface::power_down(&mut **self.surface.lock().unwrap());
        self.notifier.notify(Status::Off);
    }

    /// Clear the pin flag only; color and status stay as they are.
    pub fn reset(&self) {
        self.inner.lock().unwrap().state.pinned = false;
    }

    pub fn state(&self) -> ControllerState {
        self.inner.lock().unwrap().state.clone()
    }

    /// State copy plus a live CPU temperature reading and display facts.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state();
        let (width, height, kind) = {
            let surface = self.surface.lock().unwrap();
            let (width, height) = surface.dimensions();
            (width, height, surface.kind())
        };

        Snapshot {
            red: state.color.r,
            green: state.color.g,
            blue: state.color.b,
            brightness: state.brightness,
            last_called: state.last_called,
            cpu_temp: self.sensor.read(),
            last_called_api: state.last_called_api.map(str::to_string),
            height,
            width,
            unicorn: kind.to_string(),
            status: state.status,
            status_overwritten: state.pinned,
        }
    }

    fn apply(
        &self,
        inner: &mut Inner,
        color: Color,
        brightness: Option<f32>,
        speed: Option<f32>,
        pin: bool,
        endpoint: &'static str,
    ) {
        Self::stop_animation(inner);

        let brightness = brightness.unwrap_or(animation::DEFAULT_BRIGHTNESS);
        let status = Status::classify(color);

        inner.state.color = color;
        inner.state.brightness = brightness;
        inner.state.status = status;
        inner.state.pinned = pin;
        Self::stamp(&mut inner.state, endpoint);

        let spec = match positive(speed) {
            Some(period) => AnimationSpec::Blink {
                color,
                brightness,
                period,
            },
            None => AnimationSpec::Solid { color, brightness },
        };
        inner.animation = Some(AnimationHandle::launch(spec, self.surface.clone()));

        if pin {
            self.notifier.notify(status);
        }
    }

    /// Stop-then-join: returns only once the old loop has exited.
    fn stop_animation(inner: &mut Inner) {
        if let Some(handle) = inner.animation.take() {
            handle.stop();
        }
    }

    fn stamp(state: &mut ControllerState, endpoint: &'static str) {
        state.last_called = Some(Utc::now());
        state.last_called_api = Some(endpoint);
    }
}

fn positive(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MockSurface;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::thread;
    use std::time::Duration;

    struct RecordingNotifier(Mutex<Vec<Status>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, status: Status) {
            self.0.lock().unwrap().push(status);
        }
    }

    impl RecordingNotifier {
        fn seen(&self) -> Vec<Status> {
            self.0.lock().unwrap().clone()
        }
    }

    fn controller() -> (StatusController, MockSurface, Arc<RecordingNotifier>) {
        let mock = MockSurface::new(8, 4);
        let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));
        let controller = StatusController::new(
            surface::shared(Box::new(mock.clone())),
            notifier.clone(),
            CpuTempSensor::new(),
        );
        (controller, mock, notifier)
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not met within 1s");
    }

    #[rstest]
    #[case(Color::new(0, 144, 0), Status::Available)]
    #[case(Color::new(179, 0, 0), Status::Busy)]
    #[case(Color::new(255, 191, 0), Status::Away)]
    #[case(Color::new(0, 0, 0), Status::Unknown)]
    #[case(Color::new(1, 2, 3), Status::Unknown)]
    #[case(Color::new(0, 144, 1), Status::Unknown)]
    fn test_classify(#[case] color: Color, #[case] expected: Status) {
        assert_eq!(Status::classify(color), expected);
    }

    #[test]
    fn set_status_derives_status_and_fills_surface() {
        let (controller, mock, notifier) = controller();
        controller.set_status(color::AVAILABLE, None, None, false, "/api/switch");
        wait_until(|| mock.presents() >= 1);

        let state = controller.state();
        assert_eq!(state.status, Status::Available);
        assert_eq!(state.color, color::AVAILABLE);
        assert!(!state.pinned);
        assert_eq!(state.last_called_api, Some("/api/switch"));
        assert!(state.last_called.is_some());
        assert_eq!(mock.pixel(0, 0), color::AVAILABLE);
        // non-pinning calls never fire webhooks
        assert_eq!(notifier.seen(), vec![]);
        controller.switch_off("/api/off");
    }

    #[test]
    fn pinned_status_resists_plain_requests_until_reset() {
        let (controller, _mock, notifier) = controller();
        controller.set_status(color::BUSY, None, None, true, "/api/busy");
        assert_eq!(notifier.seen(), vec![Status::Busy]);

        controller.set_status(Color::new(10, 20, 30), None, None, false, "/api/switch");
        let state = controller.state();
        assert_eq!(state.status, Status::Busy);
        assert_eq!(state.color, color::BUSY);
        assert!(state.pinned);
        assert_eq!(state.last_called_api, Some("/api/busy"));

        controller.reset();
        assert!(!controller.state().pinned);

        controller.set_status(Color::new(10, 20, 30), None, None, false, "/api/switch");
        let state = controller.state();
        assert_eq!(state.status, Status::Unknown);
        assert_eq!(state.color, Color::new(10, 20, 30));
        controller.switch_off("/api/off");
    }

    #[test]
    fn pinned_call_replaces_pinned_status() {
        let (controller, _mock, _notifier) = controller();
        controller.set_status(color::BUSY, None, None, true, "/api/busy");
        controller.set_status(color::AWAY, None, None, true, "/api/away");
        let state = controller.state();
        assert_eq!(state.status, Status::Away);
        assert!(state.pinned);
        controller.switch_off("/api/off");
    }

    #[test]
    fn switch_on_overrides_pin_with_random_hue() {
        let (controller, mock, _notifier) = controller();
        controller.set_status(color::BUSY, None, None, true, "/api/busy");
        controller.switch_on("/api/on");
        wait_until(|| controller.state().status != Status::Busy || !mock.is_dark());
        assert!(!controller.state().pinned);
        assert_eq!(controller.state().last_called_api, Some("/api/on"));
        controller.switch_off("/api/off");
    }

    #[test]
    fn switch_off_is_idempotent() {
        let (controller, mock, notifier) = controller();
        controller.set_rainbow(None, None, "/api/rainbow");
        wait_until(|| mock.presents() >= 2);

        controller.switch_off("/api/off");
        controller.switch_off("/api/off");

        let state = controller.state();
        assert_eq!(state.status, Status::Off);
        assert_eq!(state.color, color::BLACK);
        assert!(!state.pinned);
        assert!(mock.is_dark());
        assert!(mock.is_powered_off());
        assert_eq!(notifier.seen(), vec![Status::Rainbow, Status::Off, Status::Off]);
    }

    #[test]
    fn rainbow_then_off_stops_all_frames() {
        let (controller, mock, _notifier) = controller();
        controller.set_rainbow(None, Some(0.005), "/api/rainbow");
        wait_until(|| mock.presents() >= 3);

        controller.switch_off("/api/off");
        assert!(mock.is_dark());

        let after_off = mock.presents();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(mock.presents(), after_off);
    }

    #[test]
    fn new_animation_waits_for_previous_to_exit() {
        let (controller, mock, _notifier) = controller();
        controller.set_status(color::BUSY, None, Some(0.01), false, "/api/switch");
        wait_until(|| mock.presents() >= 3);

        // switching stops-and-joins the blink before the solid starts
        let before = mock.presents();
        controller.set_status(color::AVAILABLE, None, None, false, "/api/switch");
        wait_until(|| mock.presents() > before);
        wait_until(|| mock.pixel(0, 0) == color::AVAILABLE);

        let settled = mock.presents();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(mock.presents(), settled);
        controller.switch_off("/api/off");
    }

    #[test]
    fn blink_speed_launches_blinking_animation() {
        let (controller, mock, _notifier) = controller();
        controller.set_status(color::AWAY, Some(0.8), Some(0.01), false, "/api/switch");
        wait_until(|| mock.presents() >= 4);
        assert_eq!(controller.state().brightness, 0.8);
        controller.switch_off("/api/off");
    }

    #[test]
    fn snapshot_reports_display_facts() {
        let (controller, _mock, _notifier) = controller();
        controller.set_status(color::AVAILABLE, None, None, true, "/api/available");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.red, 0);
        assert_eq!(snapshot.green, 144);
        assert_eq!(snapshot.blue, 0);
        assert_eq!(snapshot.width, 8);
        assert_eq!(snapshot.height, 4);
        assert_eq!(snapshot.unicorn, "mock");
        assert_eq!(snapshot.status, Status::Available);
        assert!(snapshot.status_overwritten);
        assert!(snapshot.cpu_temp > 0.0);
        controller.switch_off("/api/off");
    }

    #[test]
    fn reset_does_not_touch_color_or_status() {
        let (controller, _mock, _notifier) = controller();
        controller.set_status(color::AWAY, None, None, true, "/api/away");
        controller.reset();
        let state = controller.state();
        assert_eq!(state.status, Status::Away);
        assert_eq!(state.color, color::AWAY);
        assert!(!state.pinned);
        controller.switch_off("/api/off");
    }
}
