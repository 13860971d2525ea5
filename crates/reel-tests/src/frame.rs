//! Integration tests for frame resolution, stacks and teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use reel_core::{Context, Frame, Image, ImageFormat, OpaqueData, Profile, STACK_CAPACITY};

fn context() -> Arc<Context> {
    Context::new(Profile {
        width: 4,
        height: 2,
        ..Profile::default()
    })
}

fn counted(frame: &mut Frame, count: &Arc<AtomicUsize>) {
    let seen = Arc::clone(count);
    frame.properties_mut().set_data(
        "tracker",
        OpaqueData::new((), 0).with_destructor(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })),
    );
}

proptest! {
    #[test]
    fn image_stack_pops_in_reverse(n in 0usize..=STACK_CAPACITY) {
        let ctx = context();
        let mut frame = Frame::new(&ctx);
        for label in 0..n {
            let label = label as u8;
            let pushed = frame.push_get_image(Box::new(
                move |_: &mut Frame, _: ImageFormat, _: bool| {
                    Ok(Image::new(ImageFormat::None, 0, 0, vec![label]))
                },
            ));
            prop_assert!(pushed.is_ok());
        }
        let mut popped = Vec::new();
        while let Some(get_image) = frame.pop_get_image() {
            let image = get_image(&mut frame, ImageFormat::None, false).unwrap();
            popped.push(image.data[0]);
        }
        let expected: Vec<u8> = (0..n as u8).rev().collect();
        prop_assert_eq!(popped, expected);
    }
}

#[test]
fn chained_capabilities_wrap_the_one_below() {
    let ctx = context();
    let mut frame = Frame::new(&ctx);
    frame.set_image(vec![16, 128].repeat(8), 4, 2);
    for label in [1u8, 2, 3] {
        frame
            .push_get_image(Box::new(
                move |frame: &mut Frame, format: ImageFormat, writable: bool| {
                    let mut image = frame.get_image(format, writable);
                    image.data_mut()[0] += label;
                    Ok(image)
                },
            ))
            .unwrap();
    }
    let image = frame.get_image(ImageFormat::Yuv422, true);
    assert_eq!(image.data[0], 22);
    assert!(frame.is_test_card());
}

#[test]
fn test_card_is_cached_across_frames() {
    let ctx = context();
    let mut first = Frame::new(&ctx);
    let mut second = Frame::new(&ctx);
    assert!(first.is_test_card());

    let a = first.get_image(ImageFormat::Yuv422, false);
    let b = first.get_image(ImageFormat::Yuv422, false);
    let c = second.get_image(ImageFormat::Yuv422, false);
    assert!(a.shares_buffer(&b));
    assert!(a.shares_buffer(&c));
    assert_eq!(a.data.as_slice(), [255u8, 128].repeat(8).as_slice());
    assert!(first.is_test_card());
}

#[test]
fn closing_a_frame_closes_its_children_once() {
    let ctx = context();
    let count = Arc::new(AtomicUsize::new(0));

    let mut grandchild = Frame::new(&ctx);
    counted(&mut grandchild, &count);
    let mut child = Frame::new(&ctx);
    counted(&mut child, &count);
    child.push_frame(grandchild).unwrap();
    let mut parent = Frame::new(&ctx);
    counted(&mut parent, &count);
    parent.push_frame(child).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 0);
    parent.close();
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn full_child_stack_hands_the_frame_back() {
    let ctx = context();
    let mut parent = Frame::new(&ctx);
    for _ in 0..STACK_CAPACITY {
        parent.push_frame(Frame::new(&ctx)).unwrap();
    }
    let mut extra = Frame::new(&ctx);
    extra.properties_mut().set("name", "extra");
    let full = parent.push_frame(extra).unwrap_err();
    assert_eq!(full.capacity, STACK_CAPACITY);
    let extra = full.into_inner();
    assert_eq!(extra.properties().get("name"), Some("extra"));
    assert_eq!(parent.child_count(), STACK_CAPACITY);
}

#[test]
fn failing_capability_degrades_to_test_card() {
    let ctx = context();
    let mut frame = Frame::new(&ctx);
    frame
        .push_get_image(Box::new(|_: &mut Frame, _: ImageFormat, _: bool| {
            Err(reel_core::ReelError::Source("decoder gone".into()))
        }))
        .unwrap();
    let image = frame.get_image(ImageFormat::Rgb24, false);
    assert_eq!(image.data.len(), 4 * 2 * 3);
    assert!(image.data.iter().all(|&b| b == 255));
}
