mod support;

use ps2dev::mouse::{Button, Mouse};
use ps2dev::{PacketQueue, Personality};
use support::MockBus;

fn dispatch(mouse: &mut Mouse, cmd: u8, params: &[u8], queue: &PacketQueue) -> Vec<u8> {
    let mut bus = MockBus::with_params(params);
    mouse.handle_command(cmd, &mut bus, queue).unwrap();
    bus.written
}

#[test]
fn intellimouse_knock_promotes_to_wheel() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xFF, &[], &queue); // RESET, bytes not asserted here

    let mut wire = Vec::new();
    wire.extend(dispatch(&mut mouse, 0xF3, &[200], &queue));
    wire.extend(dispatch(&mut mouse, 0xF3, &[100], &queue));
    wire.extend(dispatch(&mut mouse, 0xF3, &[80], &queue));
    wire.extend(dispatch(&mut mouse, 0xF2, &[], &queue));

    // Every rate write and the GET_DEVICE_ID ack is a bare 0xFA; the knock
    // pattern (200,100,80) then reports the Intellimouse wheel ID.
    let (last, acks) = wire.split_last().unwrap();
    assert!(acks.iter().all(|&b| b == 0xFA));
    assert_eq!(*last, 0x03);

    // Now a 4-byte report should include the Z axis.
    mouse.move_by(1, 0, 0);
    let mut bus = MockBus::new();
    // READ_DATA forces an immediate report through the queue.
    mouse.handle_command(0xEB, &mut bus, &queue).unwrap();
    let packet = queue.pop().expect("report enqueued");
    assert_eq!(packet.len(), 4);
}

#[test]
fn five_button_knock_requires_wheel_first() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xFF, &[], &queue);
    dispatch(&mut mouse, 0xF3, &[200], &queue);
    dispatch(&mut mouse, 0xF3, &[100], &queue);
    dispatch(&mut mouse, 0xF3, &[80], &queue);
    let id = dispatch(&mut mouse, 0xF2, &[], &queue);
    assert_eq!(*id.last().unwrap(), 0x03);

    dispatch(&mut mouse, 0xF3, &[200], &queue);
    dispatch(&mut mouse, 0xF3, &[200], &queue);
    dispatch(&mut mouse, 0xF3, &[80], &queue);
    let id = dispatch(&mut mouse, 0xF2, &[], &queue);
    assert_eq!(*id.last().unwrap(), 0x04);

    mouse.move_and_buttons(0, 0, 0, false, false, false, true, false);
    mouse
        .handle_command(0xEB, &mut MockBus::new(), &queue)
        .unwrap();
    let packet = queue.pop().expect("report enqueued");
    assert_eq!(packet.len(), 4);
    assert_eq!(packet.as_slice()[3] & 0x30, 0x10);
}

#[test]
fn five_button_knock_without_prior_wheel_is_ignored() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xFF, &[], &queue);
    dispatch(&mut mouse, 0xF3, &[200], &queue);
    dispatch(&mut mouse, 0xF3, &[200], &queue);
    dispatch(&mut mouse, 0xF3, &[80], &queue);
    let id = dispatch(&mut mouse, 0xF2, &[], &queue);

    assert_eq!(*id.last().unwrap(), 0x00);
}

#[test]
fn wrap_mode_echoes_everything_except_wrap_controls() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    let wire = dispatch(&mut mouse, 0xEE, &[], &queue); // SET_WRAP_MODE
    assert_eq!(wire, vec![0xFA]);

    let wire = dispatch(&mut mouse, 0x55, &[], &queue);
    assert_eq!(wire, vec![0x55]);

    let wire = dispatch(&mut mouse, 0xEC, &[], &queue); // RESET_WRAP_MODE
    assert_eq!(wire, vec![0xFA]);

    // Back in STREAM mode, an unknown command gets no reply at all.
    let wire = dispatch(&mut mouse, 0x55, &[], &queue);
    assert!(wire.is_empty());
}

#[test]
fn status_request_uses_or_not_and() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    mouse.press(Button::Left);
    let mut bus = MockBus::new();
    mouse.handle_command(0xE9, &mut bus, &queue).unwrap();

    // ack + 3 status bytes.
    assert_eq!(bus.written[0], 0xFA);
    assert_eq!(bus.written[1] & 0x04, 0x04, "left button bit must be set");
}

#[test]
fn unrecognised_sample_rate_is_ignored() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xF3, &[123], &queue);
    let mut bus = MockBus::new();
    mouse.handle_command(0xE9, &mut bus, &queue).unwrap();
    assert_eq!(bus.written[3], 100, "rate must remain the default");
}

#[test]
fn stream_tick_reports_button_change_with_no_motion() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xF4, &[], &queue); // ENABLE_DATA_REPORTING; default mode is STREAM

    mouse.press(Button::Left);
    mouse.service_stream_tick(&queue);

    let packet = queue
        .pop()
        .expect("a button-only change must still produce a report");
    assert_eq!(packet.len(), 3);
    assert_eq!(packet.as_slice()[0] & 0x01, 0x01, "left button bit");
}

#[test]
fn stream_tick_is_silent_when_nothing_changed() {
    let mut mouse = Mouse::new("test");
    let queue = PacketQueue::new();

    dispatch(&mut mouse, 0xF4, &[], &queue);
    mouse.service_stream_tick(&queue);

    assert!(queue.pop().is_none());
}
