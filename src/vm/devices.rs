//! Device descriptors that need no host resources.
//!
//! Each builder here is a pure function: the same inputs always give a
//! structurally identical descriptor. Pointing and keyboard devices pick a
//! richer variant only when the host platform is new enough to provide it.

use crate::error::{Error, Result};
use crate::host::PlatformVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First platform version offering the Mac trackpad device.
pub const TRACKPAD_MIN_VERSION: PlatformVersion = PlatformVersion::new(13, 0, 0);

/// First platform version offering the Mac keyboard device.
pub const MAC_KEYBOARD_MIN_VERSION: PlatformVersion = PlatformVersion::new(14, 0, 0);

/// Console port name the SPICE guest agent listens on.
pub const SPICE_AGENT_PORT_NAME: &str = "com.redhat.spice.0";

/// Console port index reserved for the clipboard agent.
pub const CLIPBOARD_PORT_INDEX: u32 = 0;

/// How the guest is booted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BootLoader {
    /// The platform's native boot path.
    #[default]
    MacOs,
}

/// Create the boot loader descriptor.
pub fn create_boot_loader() -> BootLoader {
    BootLoader::MacOs
}

/// A virtual display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    /// Width in pixels.
    pub width_px: u32,
    /// Height in pixels.
    pub height_px: u32,
    /// Pixel density.
    pub pixels_per_inch: u32,
}

impl Display {
    /// Create a display with the given geometry.
    pub const fn new(width_px: u32, height_px: u32, pixels_per_inch: u32) -> Self {
        Self {
            width_px,
            height_px,
            pixels_per_inch,
        }
    }

    /// Reject zero-sized geometry.
    pub fn validate(&self) -> Result<()> {
        if self.width_px == 0 || self.height_px == 0 || self.pixels_per_inch == 0 {
            return Err(Error::InvalidDisplay(format!(
                "{}: dimensions and density must be non-zero",
                self
            )));
        }
        Ok(())
    }
}

/// Parses `WIDTHxHEIGHT` or `WIDTHxHEIGHT@PPI`. Without a density, the
/// default of 80 ppi is used.
impl FromStr for Display {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (size, ppi) = match s.split_once('@') {
            Some((size, ppi)) => {
                let ppi = ppi
                    .parse::<u32>()
                    .map_err(|_| Error::InvalidDisplay(format!("invalid density '{}'", ppi)))?;
                (size, ppi)
            }
            None => (s, crate::config::DEFAULT_PIXELS_PER_INCH),
        };

        let (width, height) = size.split_once(['x', 'X']).ok_or_else(|| {
            Error::InvalidDisplay(format!("'{}': expected WIDTHxHEIGHT[@PPI]", s))
        })?;
        let width = width
            .parse::<u32>()
            .map_err(|_| Error::InvalidDisplay(format!("invalid width '{}'", width)))?;
        let height = height
            .parse::<u32>()
            .map_err(|_| Error::InvalidDisplay(format!("invalid height '{}'", height)))?;

        let display = Self::new(width, height, ppi);
        display.validate()?;
        Ok(display)
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{}",
            self.width_px, self.height_px, self.pixels_per_inch
        )
    }
}

/// Graphics device with its displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsDevice {
    /// Attached displays.
    pub displays: Vec<Display>,
}

/// Create a graphics device with a single display.
pub fn create_graphics_device(display: &Display) -> GraphicsDevice {
    GraphicsDevice {
        displays: vec![*display],
    }
}

/// One audio stream of the sound device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum AudioStream {
    /// Guest input fed by the host microphone.
    Input,
    /// Guest output played on the host speakers.
    Output,
}

/// Virtio sound device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Configured streams.
    pub streams: Vec<AudioStream>,
}

/// Create a bidirectional sound device.
pub fn create_audio_device() -> AudioDevice {
    AudioDevice {
        streams: vec![AudioStream::Input, AudioStream::Output],
    }
}

/// Pointing device variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointingDevice {
    /// Mac trackpad with multi-touch gestures.
    MacTrackpad,
    /// Generic USB absolute pointer.
    UsbScreenCoordinate,
}

/// Select the pointing device for the host platform.
///
/// An unknown platform version gets the generic variant.
pub fn create_pointing_device(platform: Option<PlatformVersion>) -> PointingDevice {
    match platform {
        Some(v) if v.at_least(TRACKPAD_MIN_VERSION) => PointingDevice::MacTrackpad,
        _ => PointingDevice::UsbScreenCoordinate,
    }
}

/// Keyboard device variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardDevice {
    /// Mac keyboard with function-key and globe-key support.
    Mac,
    /// Generic USB keyboard.
    Usb,
}

/// Select the keyboard device for the host platform.
///
/// An unknown platform version gets the generic variant.
pub fn create_keyboard_device(platform: Option<PlatformVersion>) -> KeyboardDevice {
    match platform {
        Some(v) if v.at_least(MAC_KEYBOARD_MIN_VERSION) => KeyboardDevice::Mac,
        _ => KeyboardDevice::Usb,
    }
}

/// What is connected to a console port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleAttachment {
    /// SPICE guest agent bridge.
    SpiceAgent {
        /// Share the clipboard between host and guest.
        shares_clipboard: bool,
    },
}

/// A named console port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolePort {
    /// Port index on the console device.
    pub index: u32,
    /// Port name the guest sees.
    pub name: String,
    /// Host-side attachment.
    pub attachment: ConsoleAttachment,
}

/// Virtio console device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleDevice {
    /// Configured ports, ordered by index.
    pub ports: Vec<ConsolePort>,
}

impl ConsoleDevice {
    /// Look up a port by index.
    pub fn port(&self, index: u32) -> Option<&ConsolePort> {
        self.ports.iter().find(|p| p.index == index)
    }
}

/// Create a console device bridging the clipboard through the SPICE agent.
pub fn create_console_device() -> ConsoleDevice {
    let port = ConsolePort {
        index: CLIPBOARD_PORT_INDEX,
        name: SPICE_AGENT_PORT_NAME.to_string(),
        attachment: ConsoleAttachment::SpiceAgent {
            shares_clipboard: true,
        },
    };

    ConsoleDevice { ports: vec![port] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_device_default_display() {
        let display = crate::config::Defaults::default().display;
        let graphics = create_graphics_device(&display);
        assert_eq!(graphics.displays, vec![Display::new(1920, 1200, 80)]);
        assert_eq!(graphics, create_graphics_device(&display));
    }

    #[test]
    fn test_display_parse() {
        let d: Display = "2560x1600@110".parse().unwrap();
        assert_eq!(d, Display::new(2560, 1600, 110));

        let d: Display = "1280X800".parse().unwrap();
        assert_eq!(d, Display::new(1280, 800, 80));

        for input in ["1920", "0x1200", "1920x1200@0", "axb", "1920x1200@"] {
            assert!(
                input.parse::<Display>().is_err(),
                "{:?} should not parse",
                input
            );
        }
    }

    #[test]
    fn test_audio_device_is_bidirectional() {
        let audio = create_audio_device();
        assert_eq!(audio.streams, vec![AudioStream::Input, AudioStream::Output]);
        assert_eq!(audio, create_audio_device());
    }

    #[test]
    fn test_keyboard_selection() {
        // (platform, expected)
        let cases = [
            (None, KeyboardDevice::Usb),
            (Some(PlatformVersion::new(13, 6, 1)), KeyboardDevice::Usb),
            (Some(PlatformVersion::new(14, 0, 0)), KeyboardDevice::Mac),
            (Some(PlatformVersion::new(15, 2, 0)), KeyboardDevice::Mac),
        ];
        for (platform, expected) in cases {
            assert_eq!(create_keyboard_device(platform), expected, "{:?}", platform);
        }
    }

    #[test]
    fn test_pointing_selection() {
        assert_eq!(
            create_pointing_device(None),
            PointingDevice::UsbScreenCoordinate
        );
        assert_eq!(
            create_pointing_device(Some(PlatformVersion::new(12, 7, 0))),
            PointingDevice::UsbScreenCoordinate
        );
        assert_eq!(
            create_pointing_device(Some(PlatformVersion::new(13, 0, 0))),
            PointingDevice::MacTrackpad
        );
    }

    #[test]
    fn test_console_has_single_clipboard_port() {
        let console = create_console_device();
        assert_eq!(console.ports.len(), 1);

        let port = console.port(0).unwrap();
        assert_eq!(port.index, CLIPBOARD_PORT_INDEX);
        assert_eq!(port.name, SPICE_AGENT_PORT_NAME);
        assert_eq!(
            port.attachment,
            ConsoleAttachment::SpiceAgent {
                shares_clipboard: true
            }
        );
        assert_eq!(console, create_console_device());
    }

    #[test]
    fn test_boot_loader_is_native() {
        assert_eq!(create_boot_loader(), BootLoader::MacOs);
    }
}
