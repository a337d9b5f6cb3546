//! Configurable fakes for the registry contract, shared by the unit tests.

use crate::device::{DeviceInfo, MAX_RESOLUTION, MIN_RESOLUTION};
use crate::error::{Result, ScanError};
use crate::page::{Page, PixelFormat};
use crate::registry::{
    DeviceRegistry, OPT_MODE, OPT_RESOLUTION, OptionValue, ScanDevice, ScanSession,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Blocks a fake session's first read until a test opens it.
#[derive(Clone, Default)]
pub(crate) struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub(crate) fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut opened = lock.lock().unwrap();
        while !*opened {
            opened = cvar.wait(opened).unwrap();
        }
    }
}

/// A scripted scanner. Clones share their counters, so a test can keep a
/// handle on a device it has given to a [`FakeRegistry`].
#[derive(Clone)]
pub(crate) struct FakeDevice {
    info: DeviceInfo,
    chunks: Vec<Vec<u8>>,
    pages: Vec<Page>,
    fail_read_at: Option<usize>,
    panic_on_read: bool,
    gate: Option<Gate>,
    sessions: Arc<AtomicUsize>,
    applied: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeDevice {
    /// A device whose display label is `label`, with no scan data scripted.
    pub(crate) fn named(label: &str) -> Self {
        Self {
            info: DeviceInfo {
                name: "fake:usb:001:001".to_string(),
                vendor: "Fakeco".to_string(),
                model: label.to_string(),
            },
            chunks: Vec::new(),
            pages: Vec::new(),
            fail_read_at: None,
            panic_on_read: false,
            gate: None,
            sessions: Arc::new(AtomicUsize::new(0)),
            applied: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Scripts one small RGB page delivered in `chunks` read chunks.
    pub(crate) fn with_chunked_page(mut self, chunks: usize) -> Self {
        self.chunks = (0..chunks).map(|_| vec![0xAB; 64]).collect();
        self.pages = vec![Page {
            width: 8,
            height: 6,
            format: PixelFormat::Rgb8,
            data: vec![0x55; 8 * 6 * 3],
        }];
        self
    }

    /// Makes the read loop fail when it reaches chunk `index`.
    pub(crate) fn failing_read_at(mut self, index: usize) -> Self {
        self.fail_read_at = Some(index);
        self
    }

    /// Makes the first read block until `gate` is opened.
    pub(crate) fn gated_by(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Makes the first read panic, killing the worker thread.
    pub(crate) fn panicking_on_read(mut self) -> Self {
        self.panic_on_read = true;
        self
    }

    /// Shared counter of `begin_session` calls across clones.
    pub(crate) fn session_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.sessions)
    }

    /// The options applied so far, in application order.
    pub(crate) fn applied_options(&self) -> Vec<(String, String)> {
        self.applied.lock().unwrap().clone()
    }
}

impl ScanDevice for FakeDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        match (name, &value) {
            (OPT_RESOLUTION, OptionValue::Int(v)) => {
                if !(i64::from(MIN_RESOLUTION)..=i64::from(MAX_RESOLUTION)).contains(v) {
                    return Err(ScanError::configuration(
                        name,
                        format!("{v} is out of range"),
                    ));
                }
            }
            (OPT_MODE, OptionValue::Str(s)) => {
                if !matches!(s.as_str(), "Color" | "Gray" | "Lineart") {
                    return Err(ScanError::configuration(name, format!("unsupported mode '{s}'")));
                }
            }
            _ => return Err(ScanError::configuration(name, "unrecognized option")),
        }
        self.applied
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn begin_session(&mut self, _multiple: bool) -> Result<Box<dyn ScanSession + '_>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            chunks: self.chunks.clone().into(),
            pages: self.pages.clone(),
            served: 0,
            fail_read_at: self.fail_read_at,
            panic_on_read: self.panic_on_read,
            gate: self.gate.clone(),
        }))
    }
}

struct FakeSession {
    chunks: VecDeque<Vec<u8>>,
    pages: Vec<Page>,
    served: usize,
    fail_read_at: Option<usize>,
    panic_on_read: bool,
    gate: Option<Gate>,
}

impl ScanSession for FakeSession {
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(gate) = self.gate.take() {
            gate.wait();
        }
        if self.panic_on_read {
            panic!("scripted read panic");
        }
        if self.fail_read_at == Some(self.served) {
            return Err(ScanError::acquisition("device disconnected mid-scan"));
        }
        self.served += 1;
        Ok(self.chunks.pop_front())
    }

    fn take_pages(&mut self) -> Vec<Page> {
        std::mem::take(&mut self.pages)
    }
}

/// A registry over a fixed set of scripted devices. Every enumeration hands
/// out fresh clones, so a controller can list repeatedly.
pub(crate) struct FakeRegistry {
    devices: Vec<FakeDevice>,
}

impl FakeRegistry {
    pub(crate) fn with_device(device: FakeDevice) -> Self {
        Self {
            devices: vec![device],
        }
    }
}

impl DeviceRegistry for FakeRegistry {
    fn list_devices(&self) -> Result<Vec<Box<dyn ScanDevice>>> {
        Ok(self
            .devices
            .iter()
            .map(|d| Box::new(d.clone()) as Box<dyn ScanDevice>)
            .collect())
    }
}
