//! Whole-pipeline scenarios.

use std::sync::Arc;

use reel_consumer::Consumer;
use reel_core::{keys, Context, ImageFormat, Profile};
use reel_effects::{EffectName, Transition};
use reel_media::{Eof, Multitrack, Producer, Tractor};

#[test]
fn producer_holds_last_frame_after_out_point() {
    let ctx = Context::new(Profile::default());
    let mut producer = Producer::colour(&ctx, "red");
    producer.set_in_and_out(0.0, 49.0);
    producer.set_eof(Eof::Pause);
    assert_eq!(producer.fps(), 25.0);
    assert_eq!(producer.speed(), 1.0);

    for call in 1..=60 {
        let frame = producer.get_frame(0);
        let expected = if call >= 50 { 49.0 } else { (call - 1) as f64 };
        assert_eq!(frame.timecode(), expected, "call {call}");
        assert_eq!(frame.properties().get_double(keys::FPS), 25.0);
        assert_eq!(frame.properties().get_double(keys::SPEED), 1.0);
        assert!(!frame.is_test_card());
    }
    assert_eq!(producer.position(), 49.0);
}

fn graph(ctx: &Arc<Context>, effect: EffectName) -> Tractor {
    let mut multitrack = Multitrack::new(ctx);
    multitrack.connect(Box::new(Producer::colour(ctx, "black")), 0);
    multitrack.connect(Box::new(Producer::colour(ctx, "white")), 1);
    let mut transition = Transition::with_effect(ctx, effect);
    transition.set_in_and_out(2.0, 6.0);
    transition.connect(Box::new(multitrack), 0, 1);
    Tractor::new(Box::new(transition))
}

#[test]
fn every_effect_renders_through_the_consumer() {
    let ctx = Context::new(Profile {
        width: 8,
        height: 4,
        samples: 16,
        ..Profile::default()
    });
    for effect in EffectName::ALL {
        let consumer = Consumer::start(Box::new(graph(&ctx, effect)), ImageFormat::Yuv422).unwrap();
        for expected in 0..10 {
            let frame = consumer.render().unwrap();
            assert_eq!(frame.timecode, expected as f64, "{effect}");
            assert_eq!((frame.width, frame.height), (8, 4));
            assert!(!frame.test_card, "{effect} frame {expected}");
        }
        assert_eq!(consumer.events().try_iter().count(), 10);
        assert_eq!(consumer.audio().drain().len(), 8);
        consumer.stop().unwrap();
    }
}

#[test]
fn dissolve_progresses_across_the_window() {
    let ctx = Context::new(Profile {
        width: 2,
        height: 1,
        ..Profile::default()
    });
    let mut tractor = graph(&ctx, EffectName::Luma);
    let luma: Vec<u8> = (0..8)
        .map(|_| tractor.get_frame().get_image(ImageFormat::Yuv422, false).data[0])
        .collect();

    // Before the window B (white) is what the tractor keeps; inside it the
    // dissolve starts from black and brightens.
    let inside = &luma[2..6];
    assert!(luma[0] > inside[0]);
    assert!(inside.windows(2).all(|pair| pair[0] < pair[1]), "{luma:?}");
    assert_eq!(luma[6], luma[0]);
}
