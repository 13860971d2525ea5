//! Integration tests for producers, multitracks and tractors.

use std::io::Write;
use std::sync::Arc;

use proptest::prelude::*;
use reel_core::{keys, Context, ImageFormat, Profile};
use reel_media::{Eof, Multitrack, PpmSource, Producer, Tractor};

fn context() -> Arc<Context> {
    Context::new(Profile {
        width: 2,
        height: 2,
        ..Profile::default()
    })
}

#[test]
fn seek_is_clamped_under_pause() {
    let mut producer = Producer::blank(&context());
    producer.set_in_and_out(0.0, 99.0);
    assert_eq!(producer.playtime(), 100.0);

    producer.seek(150.0);
    assert_eq!(producer.position(), 99.0);
    producer.seek(-5.0);
    assert_eq!(producer.position(), 0.0);
}

proptest! {
    #[test]
    fn seek_stays_in_range(
        in_point in 0.0f64..500.0,
        len in 1.0f64..500.0,
        target in -1000i32..2000,
    ) {
        let mut producer = Producer::blank(&context());
        producer.set_in_and_out(in_point.floor(), (in_point + len).floor());
        producer.seek(target as f64);
        let position = producer.position();
        prop_assert!(position >= 0.0);
        prop_assert!(position <= producer.playtime() - 1.0);
        prop_assert_eq!(producer.frame(), producer.in_point() + position);
    }
}

#[test]
fn continue_runs_past_out_into_test_cards() {
    let mut producer = Producer::colour(&context(), "white");
    producer.set_in_and_out(0.0, 1.0);
    producer.set_eof(Eof::Continue);

    assert!(!producer.get_frame(0).is_test_card());
    assert!(!producer.get_frame(0).is_test_card());
    let past = producer.get_frame(0);
    assert!(past.is_test_card());
    assert_eq!(past.timecode(), 2.0);
    assert_eq!(past.properties().get_double(keys::FPS), 25.0);
}

#[test]
fn ppm_file_feeds_a_tractor() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for rgb in [[0u8, 255, 0], [255, 255, 255]] {
        file.write_all(b"P6\n2 2\n255\n").unwrap();
        file.write_all(&rgb.repeat(4)).unwrap();
    }
    file.flush().unwrap();

    let ctx = context();
    let source = PpmSource::open(file.path()).unwrap();
    let mut multitrack = Multitrack::new(&ctx);
    multitrack.connect(Box::new(Producer::source(&ctx, Box::new(source))), 0);
    multitrack.connect(Box::new(Producer::blank(&ctx)), 1);
    let mut tractor = Tractor::new(Box::new(multitrack));

    let mut green = tractor.get_frame();
    assert_eq!(
        green.get_image(ImageFormat::Rgb24, false).data.as_slice(),
        [0u8, 255, 0].repeat(4).as_slice()
    );
    let mut white = tractor.get_frame();
    assert_eq!(white.timecode(), 1.0);
    assert!(white.get_image(ImageFormat::Rgb24, false).data.iter().all(|&b| b == 255));

    // Stream exhausted: the test card from track 0 is what remains
    let end = tractor.get_frame();
    assert!(end.is_test_card());
    assert_eq!(end.timecode(), 2.0);
}

#[test]
fn multitrack_empty_track_is_test_card() {
    let ctx = context();
    let mut multitrack = Multitrack::new(&ctx);
    multitrack.connect(Box::new(Producer::colour(&ctx, "red")), 1);
    assert!(multitrack.get_frame(0).is_test_card());
    assert!(!multitrack.get_frame(1).is_test_card());
    assert!(multitrack.get_frame(5).is_test_card());
}
