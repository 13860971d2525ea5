//! A consumer that owns its service on a dedicated worker thread.
//!
//! Pipeline objects are not thread-safe, so nothing but the worker ever
//! touches the service or its frames. Callers talk to the worker through a
//! rendezvous holding at most one pending command; `render` blocks until the
//! worker signals the result. Renders from several callers are serialised,
//! each caller owning the slot from posting until it has taken its result.
//! Audio goes out through a separately locked [`AudioQueue`] and every
//! rendered frame is announced on a channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use reel_core::{AudioFormat, ImageFormat, ReelError, Result, Service, Timecode};
use tracing::{debug, info, warn};

use crate::audio_queue::AudioQueue;

/// What the worker resolved for one output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    /// Zero-based count of frames rendered by this consumer.
    pub sequence: u64,
    pub timecode: Timecode,
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    pub test_card: bool,
    /// Samples per channel pushed to the audio queue.
    pub audio_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Stop,
}

#[derive(Default)]
struct Slot {
    command: Option<Command>,
    result: Option<RenderedFrame>,
    /// A caller has posted a render and not yet taken its result.
    busy: bool,
    worker_alive: bool,
}

/// One pending command, one result, one condition variable.
#[derive(Default)]
struct Rendezvous {
    slot: Mutex<Slot>,
    signal: Condvar,
}

impl Rendezvous {
    /// Block until no other render is in flight, then post `command`.
    fn post(&self, command: Command) -> Result<()> {
        let mut slot = self.slot.lock();
        while (slot.busy || slot.command.is_some()) && slot.worker_alive {
            self.signal.wait(&mut slot);
        }
        if !slot.worker_alive {
            return Err(ReelError::Consumer("worker thread has exited".into()));
        }
        slot.busy = command == Command::Render;
        slot.command = Some(command);
        self.signal.notify_all();
        Ok(())
    }

    /// Block until the worker publishes a result, then release the slot.
    fn wait_result(&self) -> Result<RenderedFrame> {
        let mut slot = self.slot.lock();
        let outcome = loop {
            if let Some(result) = slot.result.take() {
                break Ok(result);
            }
            if !slot.worker_alive {
                break Err(ReelError::Consumer("worker thread exited mid-render".into()));
            }
            self.signal.wait(&mut slot);
        };
        slot.busy = false;
        self.signal.notify_all();
        outcome
    }

    /// Worker side: block for the next command and clear the slot.
    fn take_command(&self) -> Command {
        let mut slot = self.slot.lock();
        loop {
            if let Some(command) = slot.command.take() {
                self.signal.notify_all();
                return command;
            }
            self.signal.wait(&mut slot);
        }
    }

    fn publish(&self, result: RenderedFrame) {
        self.slot.lock().result = Some(result);
        self.signal.notify_all();
    }
}

/// Marks the worker gone however it leaves, so callers never wait forever.
struct WorkerGuard(Arc<Rendezvous>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.slot.lock().worker_alive = false;
        self.0.signal.notify_all();
    }
}

struct Worker {
    service: Box<dyn Service>,
    format: ImageFormat,
    audio: Arc<AudioQueue>,
    events: Sender<RenderedFrame>,
    rendered: u64,
}

impl Worker {
    fn run(mut self, rendezvous: Arc<Rendezvous>) {
        let _guard = WorkerGuard(Arc::clone(&rendezvous));
        info!(format = ?self.format, "consumer worker started");
        while rendezvous.take_command() == Command::Render {
            let result = self.render();
            if self.events.send(result.clone()).is_err() {
                debug!("no listener for rendered frames");
            }
            rendezvous.publish(result);
        }
        info!(rendered = self.rendered, "consumer worker stopped");
    }

    fn render(&mut self) -> RenderedFrame {
        let mut frame = self.service.get_frame(0);
        // Resolving empties the image stack, so ask first
        let test_card = frame.is_test_card();
        let image = frame.get_image(self.format, false);
        let audio = frame.get_audio(AudioFormat::Pcm16);
        let result = RenderedFrame {
            sequence: self.rendered,
            timecode: frame.timecode(),
            format: image.format,
            width: image.width,
            height: image.height,
            test_card,
            audio_samples: audio.samples,
        };
        self.audio.push(audio);
        frame.close();
        self.rendered += 1;
        debug!(sequence = result.sequence, timecode = result.timecode, "frame rendered");
        result
    }
}

/// Renders frames from a service on its own thread.
pub struct Consumer {
    rendezvous: Arc<Rendezvous>,
    audio: Arc<AudioQueue>,
    events: Receiver<RenderedFrame>,
    worker: Option<JoinHandle<()>>,
}

impl Consumer {
    /// Move `service` onto a new worker thread resolving pictures as `format`.
    pub fn start(service: Box<dyn Service>, format: ImageFormat) -> Result<Self> {
        Self::with_audio_queue(service, format, AudioQueue::default())
    }

    pub fn with_audio_queue(
        service: Box<dyn Service>,
        format: ImageFormat,
        audio: AudioQueue,
    ) -> Result<Self> {
        let rendezvous = Arc::new(Rendezvous::default());
        rendezvous.slot.lock().worker_alive = true;
        let audio = Arc::new(audio);
        let (events_tx, events) = unbounded();

        let worker = Worker {
            service,
            format,
            audio: Arc::clone(&audio),
            events: events_tx,
            rendered: 0,
        };
        let worker_rendezvous = Arc::clone(&rendezvous);
        let handle = thread::Builder::new()
            .name("reel-consumer".to_string())
            .spawn(move || worker.run(worker_rendezvous))?;

        Ok(Self {
            rendezvous,
            audio,
            events,
            worker: Some(handle),
        })
    }

    /// Render the next frame, blocking until the worker has resolved it.
    pub fn render(&self) -> Result<RenderedFrame> {
        self.rendezvous.post(Command::Render)?;
        self.rendezvous.wait_result()
    }

    /// Announcements of every rendered frame, in order.
    pub fn events(&self) -> &Receiver<RenderedFrame> {
        &self.events
    }

    pub fn audio(&self) -> &Arc<AudioQueue> {
        &self.audio
    }

    pub fn is_running(&self) -> bool {
        self.rendezvous.slot.lock().worker_alive
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        if let Err(err) = self.rendezvous.post(Command::Stop) {
            debug!(error = %err, "worker already gone");
        }
        handle
            .join()
            .map_err(|_| ReelError::Consumer("worker thread panicked".into()))
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "consumer shut down uncleanly");
        }
    }
}
