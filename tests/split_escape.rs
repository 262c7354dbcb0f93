use vis::{decode::Decoder, encode::Encoder, VisStatus};

/// Decode `text` by feeding it in pieces of `chunk` bytes.
fn decode_chunked(text: &[u8], chunk: usize) -> Vec<u8> {
    let mut decoder = Decoder::new();
    let mut decoded = vec![];
    let mut out = [0u8; 3];

    for piece in text.chunks(chunk) {
        let mut piece = piece;
        while !piece.is_empty() {
            let result = decoder.decode_bytes(piece, &mut out);
            assert!(result.status.is_ok(), "{:?}", result.status);
            decoded.extend_from_slice(&out[..result.consumed_out]);
            piece = &piece[result.consumed_in..];
        }
    }

    decoder.finish();
    let result = decoder.decode_bytes(&[], &mut out);
    assert_eq!(result.status, Ok(VisStatus::Done));
    decoded
}

/// Encode `data` into an output buffer of `size` bytes at a time.
fn encode_chunked(data: &[u8], size: usize) -> Vec<u8> {
    let mut encoder = Encoder::new();
    encoder.finish();
    let mut encoded = vec![];
    let mut out = vec![0u8; size];
    let mut data = data;

    loop {
        let result = encoder.encode_bytes(data, &mut out);
        encoded.extend_from_slice(&out[..result.consumed_out]);
        data = &data[result.consumed_in..];
        if let Ok(VisStatus::Done) = result.status {
            break;
        }
    }

    encoded
}

#[test]
fn every_split_of_escapes() {
    let text = br"x\\\s\t\001\377\^?\M-a\M^Az";
    let expected = vis::decode_bytes(text).unwrap();
    for chunk in 1..=text.len() {
        assert_eq!(decode_chunked(text, chunk), expected, "chunk {}", chunk);
    }
}

#[test]
fn every_output_size() {
    let data: Vec<u8> = b"tab\there, nul\0 and \\ and \xff".to_vec();
    let expected = vis::encode(&data).into_bytes();
    for size in 1..=8 {
        assert_eq!(encode_chunked(&data, size), expected, "size {}", size);
    }
}
