//! Parser Tests
//!
//! These tests verify:
//! - Byte-at-a-time decoding across arbitrary read boundaries
//! - Single-shot message retrieval
//! - Error reporting and per-message resynchronization
//! - Literal-value argument framing

use std::sync::Arc;

use hivekv::protocol::{Grammar, GrammarEntry, Message, Parser, Stage};
use hivekv::HiveError;

// =============================================================================
// Helper Functions
// =============================================================================

fn standard_parser() -> Parser {
    Parser::new(Arc::new(Grammar::standard()))
}

fn feed(parser: &mut Parser, bytes: &[u8]) -> Result<bool, HiveError> {
    let mut found = false;
    for &b in bytes {
        found = parser.process(b)?;
    }
    Ok(found)
}

// =============================================================================
// Basic Decoding Tests
// =============================================================================

#[test]
fn test_get_message_scenario() {
    let mut parser = standard_parser();
    assert!(feed(&mut parser, b"get13key").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("get", "key", ""));
}

#[test]
fn test_put_message_scenario() {
    let mut parser = standard_parser();
    assert!(feed(&mut parser, b"put13key15value").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("put", "key", "value"));
}

#[test]
fn test_zero_arg_commands() {
    for token in [&b"nop"[..], b"bye", b"die"] {
        let mut parser = standard_parser();
        assert!(feed(&mut parser, token).unwrap());
        let message = parser.get_message().unwrap();
        assert!(message.arg1.is_empty());
        assert!(message.arg2.is_empty());
    }
}

#[test]
fn test_no_message_before_ready() {
    let mut parser = standard_parser();
    assert!(matches!(parser.get_message(), Err(HiveError::NoMessage)));

    feed(&mut parser, b"get1").unwrap();
    assert!(matches!(parser.get_message(), Err(HiveError::NoMessage)));

    // A failed fetch does not disturb the partial message
    assert!(feed(&mut parser, b"3key").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("get", "key", ""));
}

#[test]
fn test_consecutive_messages_reuse_parser() {
    let mut parser = standard_parser();
    let stream = b"put11a11bget11adel11a";
    let mut messages = Vec::new();
    for &b in stream.iter() {
        if parser.process(b).unwrap() {
            messages.push(parser.get_message().unwrap());
        }
    }
    assert_eq!(
        messages,
        vec![
            Message::new("put", "a", "b"),
            Message::new("get", "a", ""),
            Message::new("del", "a", ""),
        ]
    );
}

// =============================================================================
// Partial Input Tests
// =============================================================================

#[test]
fn test_every_prefix_is_silent() {
    let full = b"put216hello world18abc13fgh";
    for split in 0..full.len() {
        let mut parser = standard_parser();
        let (head, tail) = full.split_at(split);

        // Pausing after any prefix: no completion, no error
        assert!(!feed(&mut parser, head).unwrap(), "prefix {} completed early", split);
        assert!(!parser.is_ready());

        // Resuming completes correctly
        assert!(feed(&mut parser, tail).unwrap(), "split {} never completed", split);
        assert_eq!(
            parser.get_message().unwrap(),
            Message::new("put", "hello world18abc", "fgh")
        );
    }
}

// =============================================================================
// Error and Resync Tests
// =============================================================================

#[test]
fn test_unknown_command_then_valid_message() {
    let mut parser = standard_parser();
    assert!(!parser.process(b'x').unwrap());
    assert!(!parser.process(b'y').unwrap());
    assert!(matches!(parser.process(b'z'), Err(HiveError::UnknownCommand(t)) if t == "xyz"));
    assert_eq!(parser.stage(), Stage::Command);

    assert!(feed(&mut parser, b"get13key").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("get", "key", ""));
}

#[test]
fn test_bad_length_of_length() {
    for bad in [&b"get0"[..], b"getx", b"get-"] {
        let mut parser = standard_parser();
        assert!(matches!(feed(&mut parser, bad), Err(HiveError::BadFormat(_))));
        assert_eq!(parser.stage(), Stage::Command);
    }
}

#[test]
fn test_bad_length_digits() {
    let mut parser = standard_parser();
    assert!(matches!(feed(&mut parser, b"put2a"), Err(HiveError::BadFormat(_))));

    let mut parser = standard_parser();
    assert!(matches!(feed(&mut parser, b"put200"), Err(HiveError::BadFormat(_))));

    // Second argument is validated the same way
    let mut parser = standard_parser();
    assert!(matches!(feed(&mut parser, b"put11k10"), Err(HiveError::BadFormat(_))));
}

#[test]
fn test_bad_format_resyncs_on_next_message() {
    let mut parser = standard_parser();
    assert!(feed(&mut parser, b"get0").is_err());
    assert!(feed(&mut parser, b"nop").unwrap());
    assert_eq!(parser.get_message().unwrap().command, "nop");
}

// =============================================================================
// Literal Argument Tests
// =============================================================================

#[test]
fn test_hed_second_argument_is_literal() {
    let mut parser = standard_parser();
    assert!(feed(&mut parser, b"hed13key15").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("hed", "key", "5"));

    let mut parser = standard_parser();
    assert!(feed(&mut parser, b"hed13key3120").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("hed", "key", "120"));
}

#[test]
fn test_literal_first_argument_skips_to_second() {
    let grammar = Grammar::new()
        .with("lit", GrammarEntry::args(2).arg1_literal())
        .unwrap()
        .with("one", GrammarEntry::args(1).arg1_literal())
        .unwrap();
    let grammar = Arc::new(grammar);

    let mut parser = Parser::new(grammar.clone());
    assert!(!feed(&mut parser, b"lit242").unwrap());
    assert_eq!(parser.stage(), Stage::Arg2LengthLength);
    assert!(feed(&mut parser, b"13abc").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("lit", "42", "abc"));

    let mut parser = Parser::new(grammar);
    assert!(feed(&mut parser, b"one17").unwrap());
    assert_eq!(parser.get_message().unwrap(), Message::new("one", "7", ""));
}

#[test]
fn test_literal_flag_is_per_argument() {
    // hed's first argument is still a framed body
    let mut parser = standard_parser();
    assert!(!feed(&mut parser, b"hed12").unwrap());
    assert_eq!(parser.stage(), Stage::Arg1);
}
