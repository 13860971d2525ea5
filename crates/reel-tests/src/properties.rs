//! Integration tests for property stores as carried by frames and producers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use reel_core::{keys, Context, Frame, OpaqueData, Profile, Properties};
use reel_media::Producer;

fn counted(count: &Arc<AtomicUsize>) -> OpaqueData {
    let seen = Arc::clone(count);
    OpaqueData::new(vec![0u8; 4], 4).with_destructor(Box::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    }))
}

proptest! {
    #[test]
    fn int_round_trips(n in any::<i32>()) {
        let mut props = Properties::new();
        props.set_int("k", n);
        prop_assert_eq!(props.get_int("k"), n);
        // And through its string view
        let text = props.get("k").map(str::to_owned);
        let mut copy = Properties::new();
        copy.set_string("k", text.as_deref());
        prop_assert_eq!(copy.get_int("k"), n);
    }

    #[test]
    fn double_round_trips_through_string(d in -1.0e9f64..1.0e9) {
        let mut props = Properties::new();
        props.set_double("k", d);
        let text = props.get("k").map(str::to_owned).unwrap_or_default();
        let mut copy = Properties::new();
        copy.set("k", &text);
        let back = copy.get_double("k");
        prop_assert!((back - d).abs() <= d.abs() * 1e-6 + 1e-6, "{} -> {} -> {}", d, text, back);
    }
}

#[test]
fn overwrite_on_a_frame_runs_destructor_once() {
    let ctx = Context::new(Profile::default());
    let count = Arc::new(AtomicUsize::new(0));
    let mut frame = Frame::new(&ctx);
    frame.properties_mut().set_data("payload", counted(&count));
    frame.properties_mut().set_int("payload", 7);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(frame.properties().get("payload"), Some("7"));
    frame.close();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn producer_defaults_are_inherited_by_copies() {
    let ctx = Context::new(Profile::default());
    let producer = Producer::blank(&ctx);
    let mut copy = Properties::new();
    copy.inherit(producer.properties());

    assert_eq!(copy.get_double(keys::FPS), 25.0);
    assert_eq!(copy.get_double(keys::SPEED), 1.0);
    assert_eq!(copy.get_position(keys::OUT), 1_799_999.0);
    assert_eq!(copy.get_position(keys::LENGTH), 1_800_000.0);
    assert_eq!(copy.get(keys::EOF), Some("pause"));
    assert_eq!(copy.get(keys::RESOURCE), Some("<producer>"));
}

#[test]
fn string_values_coerce_like_atoi() {
    let mut props = Properties::new();
    props.set("mix", "0.75 of the way");
    props.set("tracks", "12abc");
    props.set("junk", "abc");
    assert_eq!(props.get_double("mix"), 0.75);
    assert_eq!(props.get_int("tracks"), 12);
    assert_eq!(props.get_int("junk"), 0);
}
