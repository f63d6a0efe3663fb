//! Non-blocking reader for the Linux joystick interface (`/dev/input/js*`).
//!
//! Each driver event is 8 bytes: `u32` timestamp, `i16` value, `u8` type,
//! `u8` number, little-endian. A disconnected pad is not an error for the
//! caller: the device is dropped and reopened on a frame-counter schedule.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::input::gamepad::GamepadSession;

const JS_EVENT_BUTTON: u8 = 0x01;
const JS_EVENT_AXIS: u8 = 0x02;
const JS_EVENT_INIT: u8 = 0x80;
const EVENT_SIZE: usize = 8;

/// Frames between reconnect attempts (about two seconds at 60 Hz).
pub const RECONNECT_INTERVAL_FRAMES: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickEventKind {
    Button,
    Axis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoystickEvent {
    pub time_ms: u32,
    pub value: i16,
    pub kind: JoystickEventKind,
    pub number: u8,
}

impl JoystickEvent {
    /// Decodes one raw driver record. The synthetic-initial-state flag is
    /// folded away; unknown types yield `None`.
    pub fn decode(raw: &[u8; EVENT_SIZE]) -> Option<Self> {
        let time_ms = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let value = i16::from_le_bytes([raw[4], raw[5]]);
        let kind = match raw[6] & !JS_EVENT_INIT {
            JS_EVENT_BUTTON => JoystickEventKind::Button,
            JS_EVENT_AXIS => JoystickEventKind::Axis,
            _ => return None,
        };
        Some(Self {
            time_ms,
            value,
            kind,
            number: raw[7],
        })
    }

    pub fn apply(&self, session: &mut GamepadSession) {
        let number = usize::from(self.number);
        match self.kind {
            JoystickEventKind::Button => session.current.set_button(number, self.value != 0),
            JoystickEventKind::Axis => session.current.set_axis(number, self.value),
        }
    }
}

#[derive(Debug)]
pub struct Joystick {
    file: File,
}

impl Joystick {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        Ok(Self { file })
    }

    /// Drains every queued event into `session`. Returns how many were read.
    pub fn drain(&mut self, session: &mut GamepadSession) -> io::Result<usize> {
        drain_from(&mut self.file, session)
    }
}

fn drain_from(reader: &mut impl Read, session: &mut GamepadSession) -> io::Result<usize> {
    let mut count = 0;
    let mut raw = [0u8; EVENT_SIZE];
    loop {
        match reader.read(&mut raw) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            Ok(EVENT_SIZE) => {
                if let Some(event) = JoystickEvent::decode(&raw) {
                    event.apply(session);
                    count += 1;
                }
            }
            Ok(_) => return Err(io::Error::from(io::ErrorKind::InvalidData)),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(count),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Owns the optional joystick and retries it while it is missing.
#[derive(Debug)]
pub struct GamepadDevice {
    path: PathBuf,
    joystick: Option<Joystick>,
    frame: u64,
}

impl GamepadDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            joystick: None,
            frame: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.joystick.is_some()
    }

    /// Called once per loop tick.
    pub fn poll(&mut self, session: &mut GamepadSession) {
        let frame = self.frame;
        self.frame = self.frame.wrapping_add(1);

        if self.joystick.is_none() {
            if frame % RECONNECT_INTERVAL_FRAMES != 0 {
                return;
            }
            match Joystick::open(&self.path) {
                Ok(js) => {
                    info!(device = %self.path.display(), "gamepad connected");
                    session.reset();
                    self.joystick = Some(js);
                }
                Err(_) => return,
            }
        }

        if let Some(js) = &mut self.joystick
            && let Err(err) = js.drain(session)
        {
            warn!(device = %self.path.display(), %err, "gamepad disconnected");
            self.joystick = None;
            session.reset();
        }
    }
}
