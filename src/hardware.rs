//! Raspberry Pi matrix backends: the WS2812 full-size matrix on GPIO18 and
//! the SPI-attached mini matrix.
//!
//! Probing order follows the hardware reality: the mini talks SPI, so an
//! openable SPI bus means a mini is attached; otherwise the full-size matrix
//! on the PWM pin is assumed. Both are initialized at brightness 0.5.

use crate::color::{self, Color};
use crate::error::LightError;
use crate::surface::DisplaySurface;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};

pub fn probe() -> Result<Box<dyn DisplaySurface>, LightError> {
    match MiniSurface::open() {
        Ok(mini) => Ok(Box::new(mini)),
        Err(_) => Ok(Box::new(PhatSurface::open()?)),
    }
}

pub fn open(kind: &str) -> Result<Box<dyn DisplaySurface>, LightError> {
    match kind {
        "mini" => Ok(Box::new(MiniSurface::open()?)),
        _ => Ok(Box::new(PhatSurface::open()?)),
    }
}

// ── Full-size matrix (WS2812) ────────────────────────────────────────

const PHAT_WIDTH: u32 = 8;
const PHAT_HEIGHT: u32 = 4;
const PHAT_GPIO: i32 = 18;
const PHAT_DMA: i32 = 10;
const WS2812_FREQ: u32 = 800_000;

/// Strip index for each (row, column); the wiring snakes bottom-up.
const PHAT_MAP: [[usize; PHAT_WIDTH as usize]; PHAT_HEIGHT as usize] = [
    [24, 25, 26, 27, 28, 29, 30, 31],
    [16, 17, 18, 19, 20, 21, 22, 23],
    [8, 9, 10, 11, 12, 13, 14, 15],
    [0, 1, 2, 3, 4, 5, 6, 7],
];

pub struct PhatSurface {
    controller: Controller,
    pixels: [[Color; PHAT_WIDTH as usize]; PHAT_HEIGHT as usize],
    rotation: u16,
}

impl PhatSurface {
    pub fn open() -> Result<Self, LightError> {
        let controller = ControllerBuilder::new()
            .freq(WS2812_FREQ)
            .dma(PHAT_DMA)
            .channel(
                0,
                ChannelBuilder::new()
                    .pin(PHAT_GPIO)
                    .count((PHAT_WIDTH * PHAT_HEIGHT) as i32)
                    .strip_type(StripType::Ws2812)
                    .brightness(128)
                    .build(),
            )
            .build()
            .map_err(|e| LightError::Hardware(e.to_string()))?;

        Ok(Self {
            controller,
            pixels: [[color::BLACK; PHAT_WIDTH as usize]; PHAT_HEIGHT as usize],
            rotation: 0,
        })
    }

    fn flush(&mut self) {
        let flip = self.rotation == 180;
        let leds = self.controller.leds_mut(0);
        for y in 0..PHAT_HEIGHT as usize {
            for x in 0..PHAT_WIDTH as usize {
                let (px, py) = if flip {
                    (PHAT_WIDTH as usize - 1 - x, PHAT_HEIGHT as usize - 1 - y)
                } else {
                    (x, y)
                };
                let c = self.pixels[py][px];
                // rs_ws281x raw color order is [B, G, R, W]
                leds[PHAT_MAP[y][x]] = [c.b, c.g, c.r, 0];
            }
        }
    }
}

impl DisplaySurface for PhatSurface {
    fn dimensions(&self) -> (u32, u32) {
        (PHAT_WIDTH, PHAT_HEIGHT)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[y as usize][x as usize] = color;
    }

    fn set_all(&mut self, color: Color) {
        for row in &mut self.pixels {
            row.fill(color);
        }
    }

    fn clear(&mut self) {
        self.set_all(color::BLACK);
    }

    fn show(&mut self) -> Result<(), LightError> {
        self.flush();
        self.controller
            .render()
            .map_err(|e| LightError::Hardware(e.to_string()))
    }

    fn set_brightness(&mut self, value: f32) {
        let scaled = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.controller.set_brightness(0, scaled);
    }

    fn set_rotation(&mut self, degrees: u16) {
        match degrees {
            0 | 180 => self.rotation = degrees,
            // 90/270 would need a square grid; the strip map already
            // encodes the mounted orientation.
            90 | 270 => tracing::warn!("rotation {degrees} not supported on this matrix"),
            other => tracing::warn!("ignoring unsupported rotation {other}"),
        }
    }

    fn kind(&self) -> &'static str {
        "phat"
    }
}

// ── Mini matrix (SPI, dual Holtek drivers) ───────────────────────────

const MINI_WIDTH: u32 = 17;
const MINI_HEIGHT: u32 = 7;
/// Columns handled by the left-hand driver chip.
const MINI_LEFT_COLS: u32 = 9;
const MINI_SPI_CLOCK_HZ: u32 = 600_000;
/// Display RAM per driver chip.
const MINI_BUF_LEN: usize = 28 * 8;

const CMD_SOFT_RESET: u8 = 0xCC;
const CMD_GLOBAL_BRIGHTNESS: u8 = 0x37;
const CMD_COM_PIN_CTRL: u8 = 0x41;
const CMD_ROW_PIN_CTRL: u8 = 0x42;
const CMD_WRITE_DISPLAY: u8 = 0x80;
const CMD_SYSTEM_CTRL: u8 = 0x35;
const CMD_SCROLL_CTRL: u8 = 0x20;

pub struct MiniSurface {
    devices: [Spi; 2],
    pixels: Vec<Color>,
    brightness: f32,
    rotation: u16,
}

impl MiniSurface {
    pub fn open() -> Result<Self, LightError> {
        let left = Self::open_bus(SlaveSelect::Ss0)?;
        let right = Self::open_bus(SlaveSelect::Ss1)?;

        let mut surface = Self {
            devices: [left, right],
            pixels: vec![color::BLACK; (MINI_WIDTH * MINI_HEIGHT) as usize],
            brightness: 0.5,
            rotation: 0,
        };
        surface.init()?;
        Ok(surface)
    }

    fn open_bus(select: SlaveSelect) -> Result<Spi, LightError> {
        Spi::new(Bus::Spi0, select, MINI_SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| LightError::Hardware(e.to_string()))
    }

    fn init(&mut self) -> Result<(), LightError> {
        let brightness = Self::scale_brightness(self.brightness);
        for device in &mut self.devices {
            Self::write(device, &[CMD_SOFT_RESET])?;
            Self::write(device, &[CMD_GLOBAL_BRIGHTNESS, brightness])?;
            Self::write(device, &[CMD_SCROLL_CTRL, 0x00])?;
            Self::write(device, &[CMD_SYSTEM_CTRL, 0x00])?;

            let mut blank = vec![0u8; MINI_BUF_LEN + 2];
            blank[0] = CMD_WRITE_DISPLAY;
            Self::write(device, &blank)?;

            Self::write(device, &[CMD_COM_PIN_CTRL, 0xFF])?;
            Self::write(device, &[CMD_ROW_PIN_CTRL, 0xFF, 0xFF, 0xFF, 0xFF])?;
            Self::write(device, &[CMD_SYSTEM_CTRL, 0x03])?;
        }
        Ok(())
    }

    fn write(device: &mut Spi, data: &[u8]) -> Result<(), LightError> {
        device
            .write(data)
            .map(|_| ())
            .map_err(|e| LightError::Hardware(e.to_string()))
    }

    /// The driver takes 6-bit global brightness.
    fn scale_brightness(value: f32) -> u8 {
        (value.clamp(0.0, 1.0) * 63.0).round() as u8
    }

    fn pixel_at(&self, x: u32, y: u32) -> Color {
        let (px, py) = if self.rotation == 180 {
            (MINI_WIDTH - 1 - x, MINI_HEIGHT - 1 - y)
        } else {
            (x, y)
        };
        self.pixels[(py * MINI_WIDTH + px) as usize]
    }
}

impl DisplaySurface for MiniSurface {
    fn dimensions(&self) -> (u32, u32) {
        (MINI_WIDTH, MINI_HEIGHT)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * MINI_WIDTH + x) as usize] = color;
    }

    fn set_all(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn clear(&mut self) {
        self.pixels.fill(color::BLACK);
    }

    fn show(&mut self) -> Result<(), LightError> {
        for (index, range) in [(0usize, 0..MINI_LEFT_COLS), (1, MINI_LEFT_COLS..MINI_WIDTH)] {
            let mut frame = vec![0u8; MINI_BUF_LEN + 2];
            frame[0] = CMD_WRITE_DISPLAY;
            for (local_x, x) in range.clone().enumerate() {
                for y in 0..MINI_HEIGHT {
                    let c = self.pixel_at(x, y);
                    let offset = 2 + (local_x * MINI_HEIGHT as usize + y as usize) * 3;
                    frame[offset] = c.r;
                    frame[offset + 1] = c.g;
                    frame[offset + 2] = c.b;
                }
            }
            let device = &mut self.devices[index];
            Self::write(device, &frame)?;
        }
        Ok(())
    }

    fn set_brightness(&mut self, value: f32) {
        self.brightness = value.clamp(0.0, 1.0);
        let scaled = Self::scale_brightness(self.brightness);
        for device in &mut self.devices {
            if let Err(e) = Self::write(device, &[CMD_GLOBAL_BRIGHTNESS, scaled]) {
                tracing::warn!("brightness update failed: {e}");
            }
        }
    }

    fn set_rotation(&mut self, degrees: u16) {
        match degrees {
            0 | 180 => self.rotation = degrees,
            90 | 270 => tracing::warn!("rotation {degrees} not supported on this matrix"),
            other => tracing::warn!("ignoring unsupported rotation {other}"),
        }
    }

    fn off(&mut self) -> Result<(), LightError> {
        self.clear();
        self.show()?;
        for device in &mut self.devices {
            Self::write(device, &[CMD_SYSTEM_CTRL, 0x00])?;
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mini"
    }
}
