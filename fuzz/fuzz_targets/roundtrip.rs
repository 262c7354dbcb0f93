#![no_main]
use libfuzzer_sys::fuzz_target;
use vis::{decode, encode};

fuzz_target!(|data: &[u8]| {
    let mut encoder = encode::Encoder::new();
    let mut buffer = Vec::with_capacity(4 * data.len());
    let result = encoder.into_stream(&mut buffer).encode_all(data);
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert!(buffer.iter().all(u8::is_ascii_graphic));

    let mut decoder = decode::Decoder::new();
    let mut compare = vec![];
    let result = decoder.into_stream(&mut compare).decode_all(buffer.as_slice());
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert_eq!(data, &*compare);
});
