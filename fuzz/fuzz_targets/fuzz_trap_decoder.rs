#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmptrap_input::message::Message;
use snmptrap_input::{Decoded, EventMapper, TrapDecoder};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let _ = Message::decode(bytes.clone());

    // Accepted traps must always map and render.
    let decoder = TrapDecoder::new(["public"]);
    if let Ok(Decoded::Trap(trap)) = decoder.decode(bytes, None) {
        let _ = trap.to_string();
        let _ = EventMapper::default().map(&trap);
    }
});
