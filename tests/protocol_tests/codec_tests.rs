//! Codec Tests
//!
//! Tests for message encoding and the encode → incremental decode round trip.

use std::sync::Arc;

use hivekv::protocol::{create_data, Grammar, GrammarEntry, Message, Parser, Response};
use hivekv::HiveError;

// =============================================================================
// Helper Functions
// =============================================================================

fn generic_grammar() -> Arc<Grammar> {
    Arc::new(
        Grammar::new()
            .with("cm0", GrammarEntry::args(0))
            .unwrap()
            .with("cm1", GrammarEntry::args(1))
            .unwrap()
            .with("cm2", GrammarEntry::args(2))
            .unwrap(),
    )
}

/// Feed bytes one at a time, returning the message when the last byte completes it
fn decode(grammar: Arc<Grammar>, bytes: &[u8]) -> Message {
    let mut parser = Parser::new(grammar);
    let (last, body) = bytes.split_last().unwrap();
    for &b in body {
        assert!(!parser.process(b).unwrap(), "completed before the final byte");
    }
    assert!(parser.process(*last).unwrap(), "final byte did not complete the message");
    parser.get_message().unwrap()
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_get() {
    let encoded = create_data("get", b"key", b"").unwrap();
    assert_eq!(&encoded[..], b"get13key");
}

#[test]
fn test_encode_put() {
    let encoded = create_data("put", b"key", b"value").unwrap();
    assert_eq!(&encoded[..], b"put13key15value");
}

#[test]
fn test_encode_long_value_uses_two_digit_length() {
    let value = vec![b'v'; 42];
    let encoded = create_data("put", b"k", &value).unwrap();
    assert_eq!(&encoded[..7], b"put11k2");
    assert_eq!(&encoded[7..9], b"42");
    assert_eq!(encoded.len(), 9 + 42);
}

#[test]
fn test_encode_rejects_invalid_input() {
    assert!(matches!(create_data("pu", b"k", b""), Err(HiveError::InvalidArgument(_))));
    assert!(matches!(create_data("puts", b"k", b""), Err(HiveError::InvalidArgument(_))));
    assert!(matches!(create_data("put", b"", b"v"), Err(HiveError::InvalidArgument(_))));
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_round_trip_zero_one_two_args() {
    let grammar = generic_grammar();

    let bytes = create_data("cm0", b"", b"").unwrap();
    assert_eq!(decode(grammar.clone(), &bytes), Message::new("cm0", "", ""));

    let bytes = create_data("cm1", b"arg1", b"").unwrap();
    assert_eq!(decode(grammar.clone(), &bytes), Message::new("cm1", "arg1", ""));

    let bytes = create_data("cm2", b"arg1", b"arg2").unwrap();
    assert_eq!(decode(grammar, &bytes), Message::new("cm2", "arg1", "arg2"));
}

#[test]
fn test_round_trip_binary_content() {
    // Digits, NULs and high bytes inside the body must not confuse the framing
    let key: Vec<u8> = vec![b'1', b'3', 0x00, 0xFF, b'p', b'u', b't'];
    let value: Vec<u8> = (0..=255).collect();

    let bytes = create_data("cm2", &key, &value).unwrap();
    let message = decode(generic_grammar(), &bytes);

    assert_eq!(message.command, "cm2");
    assert_eq!(&message.arg1[..], &key[..]);
    assert_eq!(&message.arg2[..], &value[..]);
}

#[test]
fn test_round_trip_length_boundaries() {
    let grammar = Arc::new(Grammar::standard());
    for len in [1usize, 9, 10, 99, 100, 1000, 12345] {
        let value = vec![b'x'; len];
        let bytes = create_data("spt", b"key", &value).unwrap();
        let message = decode(grammar.clone(), &bytes);
        assert_eq!(message.arg2.len(), len, "length {}", len);
    }
}

#[test]
fn test_grammar_encode_round_trips_literal_arg() {
    let grammar = Arc::new(Grammar::standard());
    let bytes = grammar.encode("hed", b"key", b"123").unwrap();
    assert_eq!(&bytes[..], b"hed13key3123");
    assert_eq!(decode(grammar, &bytes), Message::new("hed", "key", "123"));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_value_response_decodes_with_response_grammar() {
    let bytes = Response::value("hello world").to_bytes();
    let message = decode(Arc::new(Grammar::responses()), &bytes);
    assert_eq!(
        Response::from_message(message).unwrap(),
        Response::value("hello world")
    );
}

#[test]
fn test_bare_responses_decode() {
    for response in [Response::Ack, Response::Nil, Response::Err] {
        let message = decode(Arc::new(Grammar::responses()), &response.to_bytes());
        assert_eq!(Response::from_message(message).unwrap(), response);
    }
}
