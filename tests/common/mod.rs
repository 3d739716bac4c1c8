#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use image_generation_service::{
    GenerationGateway, InferenceBackend, InferenceError, ManualClock,
    inference::GenerationRequest,
};
use parking_lot::Mutex;

pub const SUNSET_PROMPT: &str = "A beautiful sunset over mountains, high quality, detailed";

/// What the fake service does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Timeout { after: Duration },
    Image { after: Duration },
    Unauthorized(String),
    Garbage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(u32),
    Finished(u32),
}

/// Backend that replays a fixed script against a [`ManualClock`].
pub struct ScriptedBackend {
    clock: ManualClock,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    events: Mutex<Vec<Event>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new(clock: ManualClock, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            clock,
            script: Mutex::new(steps.into_iter().collect()),
            calls: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            events: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<Vec<u8>, InferenceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.events.lock().push(Event::Started(call));
        self.requests.lock().push(request.clone());

        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call #{call}"));
        tokio::task::yield_now().await;

        let outcome = match step {
            Step::Timeout { after } => {
                self.clock.advance(after);
                Err(InferenceError::Timeout)
            }
            Step::Image { after } => {
                self.clock.advance(after);
                Ok(png_bytes(4, 3))
            }
            Step::Unauthorized(message) => Err(InferenceError::Auth(message)),
            Step::Garbage => Ok(b"<html>bad gateway</html>".to_vec()),
        };

        self.events.lock().push(Event::Finished(call));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([250, 120, 30])));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .expect("encode test png");
    buffer.into_inner()
}

pub fn gateway_with(steps: impl IntoIterator<Item = Step>) -> (GenerationGateway, Arc<ScriptedBackend>, ManualClock) {
    let clock = ManualClock::new();
    let backend = Arc::new(ScriptedBackend::new(clock.clone(), steps));
    let gateway = GenerationGateway::new(backend.clone()).with_clock(Arc::new(clock.clone()));
    (gateway, backend, clock)
}

pub fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}
