//! Integration tests for transitions driven the way a tractor drives them.

use std::io::Write;
use std::sync::Arc;

use reel_core::{keys, Context, Frame, ImageFormat, Profile, Properties};
use reel_effects::{EffectName, Transition};
use reel_media::{Multitrack, Producer, Tractor};

fn context() -> Arc<Context> {
    Context::new(Profile {
        width: 2,
        height: 1,
        ..Profile::default()
    })
}

fn two_tracks(ctx: &Arc<Context>, a: &str, b: &str, start: f64) -> Multitrack {
    let mut a = Producer::colour(ctx, a);
    let mut b = Producer::colour(ctx, b);
    a.seek(start);
    b.seek(start);
    let mut multitrack = Multitrack::new(ctx);
    multitrack.connect(Box::new(a), 0);
    multitrack.connect(Box::new(b), 1);
    multitrack
}

fn colour_yuv(ctx: &Arc<Context>, colour: &str) -> Vec<u8> {
    let mut frame = Producer::colour(ctx, colour).get_frame(0);
    frame.get_image(ImageFormat::Yuv422, false).data.to_vec()
}

fn tagging(ctx: &Arc<Context>) -> Transition {
    Transition::custom(
        ctx,
        Box::new(|_: &Properties, mut a_frame: Frame, b_frame: Frame| {
            b_frame.close();
            a_frame.properties_mut().set("processed", "yes");
            a_frame
        }),
    )
}

#[test]
fn window_law_outside_and_inside() {
    let ctx = context();

    let mut transition = tagging(&ctx);
    transition.connect(Box::new(two_tracks(&ctx, "red", "blue", 5.0)), 0, 1);
    transition.set_in_and_out(10.0, 20.0);
    let a = transition.get_frame(0);
    assert_eq!(a.timecode(), 5.0);
    assert!(a.properties().get("processed").is_none());
    assert!(!transition.get_frame(1).is_test_card());

    let mut transition = tagging(&ctx);
    transition.connect(Box::new(two_tracks(&ctx, "red", "blue", 15.0)), 0, 1);
    transition.set_in_and_out(10.0, 20.0);
    let a = transition.get_frame(0);
    assert_eq!(a.properties().get("processed"), Some("yes"));
    assert!(transition.get_frame(1).is_test_card());
}

#[test]
fn tractor_cycles_through_the_window() {
    let ctx = context();
    let mut transition = tagging(&ctx);
    transition.connect(Box::new(two_tracks(&ctx, "red", "blue", 0.0)), 0, 1);
    transition.set_in_and_out(2.0, 4.0);
    let mut tractor = Tractor::new(Box::new(transition));

    let processed: Vec<bool> = (0..6)
        .map(|_| tractor.get_frame().properties().get("processed").is_some())
        .collect();
    assert_eq!(processed, [false, false, true, true, false, false]);
}

#[test]
fn luma_map_loaded_from_resource() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"P5\n2 1\n255\n").unwrap();
    file.write_all(&[0, 255]).unwrap();
    file.flush().unwrap();

    let ctx = context();
    let mut transition = Transition::with_effect(&ctx, EffectName::Luma);
    let path = file.path().to_string_lossy().into_owned();
    transition.properties_mut().set(keys::RESOURCE, &path);
    transition.connect(Box::new(two_tracks(&ctx, "black", "white", 1.0)), 0, 1);
    transition.set_in_and_out(0.0, 2.0);

    let mut frame = Tractor::new(Box::new(transition)).get_frame();
    let image = frame.get_image(ImageFormat::Yuv422, false);
    let (black, white) = (colour_yuv(&ctx, "black"), colour_yuv(&ctx, "white"));
    // Half way: the 0.0 pixel has switched to B, the 1.0 pixel has not
    assert_eq!(image.data[0], white[0]);
    assert_eq!(image.data[2], black[2]);
}

#[test]
fn luma_with_unreadable_map_dissolves() {
    let ctx = context();
    let mut transition = Transition::with_effect(&ctx, EffectName::Luma);
    transition.properties_mut().set(keys::RESOURCE, "/nonexistent/wipe.pgm");
    transition.connect(Box::new(two_tracks(&ctx, "black", "white", 0.0)), 0, 1);
    transition.set_in_and_out(0.0, 2.0);

    let mut frame = transition.get_frame(0);
    let image = frame.get_image(ImageFormat::Yuv422, false);
    // Position 0: nothing of B yet
    assert_eq!(image.data.to_vec(), colour_yuv(&ctx, "black"));
}

#[test]
fn luma_with_oversized_map_dissolves() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"P5\n4294967295 4294967295 255\n").unwrap();
    file.flush().unwrap();

    let ctx = context();
    let mut transition = Transition::with_effect(&ctx, EffectName::Luma);
    let path = file.path().to_string_lossy().into_owned();
    transition.properties_mut().set(keys::RESOURCE, &path);
    transition.connect(Box::new(two_tracks(&ctx, "black", "white", 0.0)), 0, 1);
    transition.set_in_and_out(0.0, 2.0);

    let mut frame = transition.get_frame(0);
    let image = frame.get_image(ImageFormat::Yuv422, false);
    assert_eq!(image.data.to_vec(), colour_yuv(&ctx, "black"));
}

#[test]
fn composite_lays_b_over_a() {
    let ctx = context();
    let mut transition = Transition::with_effect(&ctx, EffectName::Composite);
    transition.connect(Box::new(two_tracks(&ctx, "black", "white", 0.0)), 0, 1);
    transition.set_in_and_out(0.0, 10.0);

    let mut frame = transition.get_frame(0);
    assert_eq!(frame.child_count(), 1);
    let image = frame.get_image(ImageFormat::Yuv422, false);
    assert_eq!(image.data.to_vec(), colour_yuv(&ctx, "white"));
    assert_eq!(frame.child_count(), 0);
    assert!(transition.get_frame(1).is_test_card());
}
