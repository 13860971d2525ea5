//! The frame: the unit of data flowing through the pipeline.
//!
//! A frame is a property store plus three bounded LIFO stacks:
//! - deferred image capabilities, popped and invoked by [`Frame::get_image`]
//! - deferred audio capabilities, popped and invoked by [`Frame::get_audio`]
//! - child frames, owned by this frame until popped
//!
//! A capability that wants to change pixels first resolves the capability
//! below it by calling `get_image` on the frame it is handed, then edits the
//! result. That is how filter chains compose without the frame knowing about
//! filters.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::{self, Audio, AudioFormat, SharedSamples};
use crate::error::{Result, StackFull};
use crate::image::{self, Image, ImageFormat, SharedBytes};
use crate::keys;
use crate::profile::Context;
use crate::properties::Properties;
use crate::property::{OpaqueData, Timecode};
use crate::stack::BoundedStack;

/// A deferred image computation.
pub type GetImage = Box<dyn FnOnce(&mut Frame, ImageFormat, bool) -> Result<Image> + Send>;

/// A deferred audio computation.
pub type GetAudio = Box<dyn FnOnce(&mut Frame, AudioFormat) -> Result<Audio> + Send>;

pub struct Frame {
    // Children are closed before the frame's own properties.
    frames: BoundedStack<Box<Frame>>,
    image_stack: BoundedStack<GetImage>,
    audio_stack: BoundedStack<GetAudio>,
    properties: Properties,
    context: Arc<Context>,
}

impl Frame {
    /// Create a frame with default metadata. With nothing pushed it is a test card.
    pub fn new(context: &Arc<Context>) -> Self {
        let profile = context.profile();
        let mut properties = Properties::new();
        properties.set_timecode(keys::TIMECODE, 0.0);
        properties.set_int(keys::WIDTH, profile.width as i32);
        properties.set_int(keys::HEIGHT, profile.height as i32);
        properties.set_double(keys::ASPECT_RATIO, profile.aspect_ratio);
        Self {
            frames: BoundedStack::new("frame"),
            image_stack: BoundedStack::new("get_image"),
            audio_stack: BoundedStack::new("get_audio"),
            properties,
            context: Arc::clone(context),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn timecode(&self) -> Timecode {
        self.properties.get_timecode(keys::TIMECODE)
    }

    pub fn set_timecode(&mut self, value: Timecode) {
        self.properties.set_timecode(keys::TIMECODE, value);
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.properties.get_double(keys::ASPECT_RATIO)
    }

    pub fn set_aspect_ratio(&mut self, value: f64) {
        self.properties.set_double(keys::ASPECT_RATIO, value);
    }

    pub fn width(&self) -> usize {
        self.properties.get_int(keys::WIDTH).max(0) as usize
    }

    pub fn height(&self) -> usize {
        self.properties.get_int(keys::HEIGHT).max(0) as usize
    }

    /// Attach a raw 4:2:2 picture.
    pub fn set_image(&mut self, data: Vec<u8>, width: usize, height: usize) {
        self.set_shared_image(Arc::new(data), width, height);
    }

    /// Attach a raw 4:2:2 picture without copying a buffer that is already shared.
    pub fn set_shared_image(&mut self, data: SharedBytes, width: usize, height: usize) {
        let length = data.len();
        self.properties.set_data(keys::IMAGE, OpaqueData::new(data, length));
        self.properties.set_int(keys::WIDTH, width as i32);
        self.properties.set_int(keys::HEIGHT, height as i32);
    }

    /// The raw picture, if one is attached.
    pub fn image(&self) -> Option<Image> {
        let (data, _) = self.properties.get_data::<SharedBytes>(keys::IMAGE)?;
        Some(Image {
            format: ImageFormat::Yuv422,
            width: self.width(),
            height: self.height(),
            data: Arc::clone(data),
        })
    }

    /// Attach an alpha mask, one byte per pixel.
    pub fn set_alpha(&mut self, mask: Vec<u8>) {
        let length = mask.len();
        self.properties.set_data(keys::ALPHA, OpaqueData::new(mask, length));
    }

    pub fn alpha(&self) -> Option<&[u8]> {
        self.properties
            .get_data::<Vec<u8>>(keys::ALPHA)
            .map(|(mask, _)| mask.as_slice())
    }

    /// Attach raw audio.
    pub fn set_audio(&mut self, audio: Audio) {
        let length = audio.data.len();
        self.properties
            .set_data(keys::AUDIO, OpaqueData::new(audio.data, length));
        self.properties.set_int(keys::FREQUENCY, audio.frequency as i32);
        self.properties.set_int(keys::CHANNELS, audio.channels as i32);
        self.properties.set_int(keys::SAMPLES, audio.samples as i32);
    }

    /// The raw audio, if any is attached.
    pub fn audio(&self) -> Option<Audio> {
        let (data, _) = self.properties.get_data::<SharedSamples>(keys::AUDIO)?;
        Some(Audio {
            format: AudioFormat::Pcm16,
            frequency: self.properties.get_int(keys::FREQUENCY).max(0) as u32,
            channels: self.properties.get_int(keys::CHANNELS).max(0) as u16,
            samples: self.properties.get_int(keys::SAMPLES).max(0) as usize,
            data: Arc::clone(data),
        })
    }

    /// Stack an image capability. When refused the capability is not installed.
    pub fn push_get_image(
        &mut self,
        get_image: GetImage,
    ) -> std::result::Result<(), StackFull<GetImage>> {
        self.image_stack.push(get_image)
    }

    pub fn pop_get_image(&mut self) -> Option<GetImage> {
        self.image_stack.pop()
    }

    pub fn push_get_audio(
        &mut self,
        get_audio: GetAudio,
    ) -> std::result::Result<(), StackFull<GetAudio>> {
        self.audio_stack.push(get_audio)
    }

    pub fn pop_get_audio(&mut self) -> Option<GetAudio> {
        self.audio_stack.pop()
    }

    /// Hand a child frame to this frame. When refused the child is handed back.
    pub fn push_frame(&mut self, frame: Frame) -> std::result::Result<(), StackFull<Frame>> {
        self.frames.push(Box::new(frame)).map_err(|err| StackFull {
            item: *err.item,
            stack: err.stack,
            capacity: err.capacity,
        })
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop().map(|frame| *frame)
    }

    pub fn child_count(&self) -> usize {
        self.frames.len()
    }

    pub fn image_stack_len(&self) -> usize {
        self.image_stack.len()
    }

    /// True when nothing has contributed a real image computation.
    pub fn is_test_card(&self) -> bool {
        self.image_stack.is_empty()
    }

    /// Resolve the picture.
    ///
    /// Pops and runs the top image capability; with none left, returns the raw
    /// picture; with no raw picture either, returns the stock test card for
    /// `format`. A failing capability degrades to the test card.
    pub fn get_image(&mut self, format: ImageFormat, writable: bool) -> Image {
        if let Some(get_image) = self.image_stack.pop() {
            return match get_image(self, format, writable) {
                Ok(image) => image,
                Err(err) => {
                    warn!(error = %err, "image capability failed, using test card");
                    self.context.test_card(format)
                }
            };
        }
        if let Some(image) = self.image() {
            return image;
        }
        debug!(?format, timecode = self.timecode(), "no image, using test card");
        self.context.test_card(format)
    }

    /// Resolve the audio, mirroring [`Frame::get_image`] with silence as the
    /// test-card equivalent.
    pub fn get_audio(&mut self, format: AudioFormat) -> Audio {
        if let Some(get_audio) = self.audio_stack.pop() {
            return match get_audio(self, format) {
                Ok(audio) => audio,
                Err(err) => {
                    warn!(error = %err, "audio capability failed, using silence");
                    self.context.silence()
                }
            };
        }
        if let Some(audio) = self.audio() {
            return audio;
        }
        self.context.silence()
    }

    /// Blend `that` onto this frame's picture at (`x`, `y`) with `weight`,
    /// honouring `that`'s alpha mask. The result becomes this frame's raw image.
    pub fn composite_yuv(&mut self, that: &mut Frame, x: i32, y: i32, weight: f32) -> Image {
        let mut dest = self.get_image(ImageFormat::Yuv422, true);
        let src = that.get_image(ImageFormat::Yuv422, false);

        if !dest.is_complete_yuv422() || !src.is_complete_yuv422() {
            warn!(
                dest = ?dest.format,
                src = ?src.format,
                "composite needs complete 4:2:2 pictures, skipping"
            );
            return dest;
        }

        let (width, height) = (dest.width, dest.height);
        image::composite_yuv(
            dest.data_mut(),
            width,
            height,
            &src.data,
            src.width,
            src.height,
            that.alpha(),
            x,
            y,
            weight,
        );
        self.set_shared_image(Arc::clone(&dest.data), width, height);
        dest
    }

    /// Resize the raw picture to `width` x `height` without scaling.
    pub fn resize_yuv422(&mut self, width: usize, height: usize) -> Option<Image> {
        self.transform_image(width, height, image::resize_yuv422)
    }

    /// Rescale the raw picture to `width` x `height`, nearest neighbour.
    pub fn rescale_yuv422(&mut self, width: usize, height: usize) -> Option<Image> {
        self.transform_image(width, height, image::rescale_yuv422)
    }

    fn transform_image(
        &mut self,
        width: usize,
        height: usize,
        transform: fn(&[u8], usize, usize, usize, usize) -> Vec<u8>,
    ) -> Option<Image> {
        let input = self.image()?;
        if input.width == width && input.height == height {
            return Some(input);
        }
        if !input.is_complete_yuv422() {
            warn!(len = input.data.len(), "raw image is smaller than its size, not transforming");
            return Some(input);
        }
        let output = transform(&input.data, input.width, input.height, width, height);
        let output = Arc::new(output);
        self.set_shared_image(Arc::clone(&output), width, height);
        Some(Image {
            format: ImageFormat::Yuv422,
            width,
            height,
            data: output,
        })
    }

    /// Crossfade this frame's audio with `that`'s: `weight` 0.0 keeps ours.
    pub fn mix_audio(&mut self, that: &mut Frame, weight: f64) -> Audio {
        let mut ours = self.get_audio(AudioFormat::Pcm16);
        let theirs = that.get_audio(AudioFormat::Pcm16);
        let mixed = audio::mix_samples(&ours.data, &theirs.data, weight);
        ours.data = Arc::new(mixed);
        ours
    }

    /// Close the frame: children first, then the property store.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        while let Some(child) = self.frames.pop() {
            child.close();
        }
        self.properties.clear();
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("timecode", &self.timecode())
            .field("get_image", &self.image_stack.len())
            .field("get_audio", &self.audio_stack.len())
            .field("frames", &self.frames.len())
            .field("properties", &self.properties.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;
    use crate::profile::Profile;
    use crate::stack::STACK_CAPACITY;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context() -> Arc<Context> {
        Context::new(Profile::default())
    }

    fn solid(value: u8) -> GetImage {
        Box::new(move |_frame: &mut Frame, _format: ImageFormat, _writable: bool| {
            Ok(Image::new(ImageFormat::Yuv422, 2, 1, vec![value, 128, value, 128]))
        })
    }

    #[test]
    fn test_new_frame_defaults() {
        let frame = Frame::new(&context());
        assert_eq!(frame.timecode(), 0.0);
        assert_eq!((frame.width(), frame.height()), (720, 576));
        assert!((frame.aspect_ratio() - 4.0 / 3.0).abs() < 1e-9);
        assert!(frame.is_test_card());
    }

    #[test]
    fn test_test_card_is_cached() {
        let mut frame = Frame::new(&context());
        let a = frame.get_image(ImageFormat::Yuv422, false);
        let b = frame.get_image(ImageFormat::Yuv422, false);
        assert!(a.shares_buffer(&b));
        assert_eq!((a.width, a.height), (720, 576));
        assert_eq!(&a.data[0..4], &[255, 128, 255, 128]);
        assert!(frame.is_test_card());
    }

    #[test]
    fn test_image_stack_lifo() {
        let mut frame = Frame::new(&context());
        for value in 1..=3u8 {
            frame.push_get_image(solid(value)).unwrap();
        }
        assert!(!frame.is_test_card());
        for expected in (1..=3u8).rev() {
            let image = frame.get_image(ImageFormat::Yuv422, false);
            assert_eq!(image.data[0], expected);
        }
        assert!(frame.is_test_card());
    }

    #[test]
    fn test_image_stack_overflow_is_recoverable() {
        let mut frame = Frame::new(&context());
        for _ in 0..STACK_CAPACITY {
            frame.push_get_image(solid(1)).unwrap();
        }
        let err = frame.push_get_image(solid(2)).unwrap_err();
        assert!(matches!(ReelError::from(err), ReelError::StackFull { capacity: 10, .. }));
        assert_eq!(frame.image_stack_len(), STACK_CAPACITY);
        assert_eq!(frame.get_image(ImageFormat::Yuv422, false).data[0], 1);
    }

    #[test]
    fn test_capability_chains_to_previous() {
        let mut frame = Frame::new(&context());
        frame.push_get_image(solid(100)).unwrap();
        frame
            .push_get_image(Box::new(|frame: &mut Frame, format: ImageFormat, _writable: bool| {
                let mut image = frame.get_image(format, true);
                for y in image.data_mut().iter_mut().step_by(2) {
                    *y /= 2;
                }
                Ok(image)
            }))
            .unwrap();
        let image = frame.get_image(ImageFormat::Yuv422, false);
        assert_eq!(image.data.as_slice(), &[50, 128, 50, 128]);
    }

    #[test]
    fn test_failing_capability_degrades_to_test_card() {
        let mut frame = Frame::new(&context());
        frame
            .push_get_image(Box::new(|_: &mut Frame, _: ImageFormat, _: bool| {
                Err(ReelError::Source("decode failed".into()))
            }))
            .unwrap();
        let image = frame.get_image(ImageFormat::Rgb24, false);
        assert_eq!(image.data.len(), 720 * 576 * 3);
        assert!(image.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn test_raw_image_is_native_format() {
        let mut frame = Frame::new(&context());
        frame.set_image(vec![1, 2, 3, 4], 2, 1);
        let image = frame.get_image(ImageFormat::Rgb24, false);
        assert_eq!(image.format, ImageFormat::Yuv422);
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.data.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_writable_test_card_leaves_cache_untouched() {
        let ctx = context();
        let mut frame = Frame::new(&ctx);
        let mut image = frame.get_image(ImageFormat::Yuv422, true);
        image.data_mut()[0] = 0;
        assert_eq!(ctx.test_card(ImageFormat::Yuv422).data[0], 255);
    }

    #[test]
    fn test_audio_silence_default() {
        let mut frame = Frame::new(&context());
        let audio = frame.get_audio(AudioFormat::Pcm16);
        assert_eq!((audio.frequency, audio.channels, audio.samples), (48000, 2, 1920));
        assert_eq!(audio.data.len(), 3840);
        assert!(audio.is_silent());
    }

    #[test]
    fn test_audio_stack_and_raw() {
        let mut frame = Frame::new(&context());
        frame.set_audio(Audio::new(48000, 1, 2, vec![7, 7]));
        frame
            .push_get_audio(Box::new(|frame: &mut Frame, format: AudioFormat| {
                let mut audio = frame.get_audio(format);
                audio.data_mut().iter_mut().for_each(|s| *s *= 2);
                Ok(audio)
            }))
            .unwrap();
        assert_eq!(frame.get_audio(AudioFormat::Pcm16).data.as_slice(), &[14, 14]);
        assert_eq!(frame.get_audio(AudioFormat::Pcm16).data.as_slice(), &[7, 7]);
    }

    #[test]
    fn test_child_frames_lifo_and_overflow() {
        let ctx = context();
        let mut parent = Frame::new(&ctx);
        for i in 0..STACK_CAPACITY {
            let mut child = Frame::new(&ctx);
            child.set_timecode(i as f64);
            parent.push_frame(child).unwrap();
        }
        let mut extra = Frame::new(&ctx);
        extra.set_timecode(99.0);
        let refused = parent.push_frame(extra).unwrap_err().into_inner();
        assert_eq!(refused.timecode(), 99.0);
        assert_eq!(parent.pop_frame().unwrap().timecode(), 9.0);
        assert_eq!(parent.child_count(), STACK_CAPACITY - 1);
    }

    #[test]
    fn test_close_releases_children_before_parent() {
        let ctx = context();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let make = |name: &'static str| {
            let order = Arc::clone(&order);
            OpaqueData::new((), 0).with_destructor(Box::new(move |_| {
                order.lock().unwrap().push(name);
            }))
        };

        let mut grandchild = Frame::new(&ctx);
        grandchild.properties_mut().set_data("tag", make("grandchild"));
        let mut child = Frame::new(&ctx);
        child.properties_mut().set_data("tag", make("child"));
        child.push_frame(grandchild).unwrap();
        let mut parent = Frame::new(&ctx);
        parent.properties_mut().set_data("tag", make("parent"));
        parent.push_frame(child).unwrap();

        parent.close();
        assert_eq!(*order.lock().unwrap(), vec!["grandchild", "child", "parent"]);
    }

    #[test]
    fn test_close_runs_destructors_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut frame = Frame::new(&context());
        frame.properties_mut().set_data(
            "buffer",
            OpaqueData::new(vec![0u8; 4], 4).with_destructor(Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        );
        frame.close();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_composite_onto_test_card() {
        let ctx = Context::new(Profile {
            width: 4,
            height: 2,
            ..Profile::default()
        });
        let mut a = Frame::new(&ctx);
        let mut b = Frame::new(&ctx);
        b.set_image([20u8, 100].repeat(2), 2, 1);
        let image = a.composite_yuv(&mut b, 2, 1, 1.0);
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(&image.data[12..16], &[20, 100, 20, 100]);
        assert_eq!(&image.data[0..2], &[255, 128]);
        // The result is now a's raw picture; the cached test card is intact
        assert!(a.image().unwrap().shares_buffer(&image));
        assert_eq!(ctx.test_card(ImageFormat::Yuv422).data[12], 255);
    }

    #[test]
    fn test_resize_and_rescale_update_properties() {
        let mut frame = Frame::new(&context());
        assert!(frame.resize_yuv422(4, 4).is_none());

        frame.set_image([200u8, 128].repeat(4), 2, 2);
        let resized = frame.resize_yuv422(6, 6).unwrap();
        assert_eq!(resized.data.len(), 6 * 6 * 2);
        assert_eq!((frame.width(), frame.height()), (6, 6));

        let rescaled = frame.rescale_yuv422(12, 12).unwrap();
        assert_eq!(rescaled.data.len(), 12 * 12 * 2);
        assert_eq!((frame.width(), frame.height()), (12, 12));
    }

    #[test]
    fn test_mix_audio() {
        let ctx = context();
        let mut a = Frame::new(&ctx);
        a.set_audio(Audio::new(48000, 1, 2, vec![1000, 1000]));
        let mut b = Frame::new(&ctx);
        let mixed = a.mix_audio(&mut b, 0.25);
        assert_eq!(mixed.data.as_slice(), &[750, 750]);
    }
}
