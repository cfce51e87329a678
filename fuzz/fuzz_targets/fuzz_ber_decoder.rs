#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmptrap_input::ber::Decoder;
use snmptrap_input::pdu::{Pdu, TrapV1Pdu};
use snmptrap_input::value::Value;
use snmptrap_input::varbind::{VarBind, decode_varbind_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_ip_address();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = Value::decode(&mut decoder);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = VarBind::decode(&mut decoder);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decode_varbind_list(&mut decoder);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = Pdu::decode(&mut decoder);

    let mut decoder = Decoder::new(bytes);
    let _ = TrapV1Pdu::decode(&mut decoder);
});
