#![no_main]
use libfuzzer_sys::fuzz_target;

// Streaming with a tiny buffer and the one-shot decoder agree, on errors too.
fuzz_target!(|data: &[u8]| {
    let reference = vis::decode_bytes(data);

    let mut decoder = vis::decode::Decoder::new();
    let mut output = vec![];
    let mut out = [0u8; 2];
    let mut data = data;
    decoder.finish();
    let new = loop {
        let result = decoder.decode_bytes(data, &mut out);
        output.extend_from_slice(&out[..result.consumed_out]);
        data = &data[result.consumed_in..];
        match result.status {
            Ok(vis::VisStatus::Done) => break Ok(output),
            Ok(_) => {}
            Err(err) => break Err(err),
        }
    };

    assert_eq!(reference, new);
});
