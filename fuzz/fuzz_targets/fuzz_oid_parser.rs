#![no_main]

use libfuzzer_sys::fuzz_target;

use snmptrap_input::oid::Oid;

fuzz_target!(|data: &[u8]| {
    let _ = Oid::from_ber(data);

    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(oid) = Oid::parse(s)
    {
        // Display must parse back to the same OID.
        assert_eq!(Oid::parse(&oid.to_string()).ok(), Some(oid));
    }
});
