#[cfg(test)]
use super::*;

#[test]
fn test_consume_tracks_lines_and_columns() {
    let mut stream = CharStream::new("t.pxml", "ab\ncd");

    assert_eq!(stream.consume(), Ok('a'));
    assert_eq!((stream.line(), stream.column()), (1, 2));
    assert_eq!(stream.consume(), Ok('b'));
    assert_eq!(stream.consume(), Ok('\n'));
    assert_eq!((stream.line(), stream.column()), (2, 1));
    assert_eq!(stream.consume(), Ok('c'));
    assert_eq!((stream.line(), stream.column(), stream.index()), (2, 2, 4));
}

#[test]
fn test_crlf_is_one_line_break() {
    let mut stream = CharStream::new("t.pxml", "a\r\nb");
    stream.consume().expect("Failed to consume 'a'");

    assert_eq!(stream.consume(), Ok('\n'));
    assert_eq!((stream.line(), stream.column(), stream.index()), (2, 1, 3));
    assert_eq!(stream.consume(), Ok('b'));
}

#[test]
fn test_lone_carriage_return_takes_no_column() {
    let mut stream = CharStream::new("t.pxml", "a\rb");
    stream.consume().expect("Failed to consume 'a'");
    assert_eq!(stream.consume(), Ok('\r'));
    assert_eq!((stream.line(), stream.column()), (1, 2));
}

#[test]
fn test_lookahead_both_directions() {
    let mut stream = CharStream::new("t.pxml", "xyz");
    assert_eq!(stream.la(1), Some('x'));
    assert_eq!(stream.la(3), Some('z'));
    assert_eq!(stream.la(4), None);
    assert_eq!(stream.la(-1), None);
    assert_eq!(stream.la(0), None);

    stream.consume().expect("Failed to consume");
    stream.consume().expect("Failed to consume");
    assert_eq!(stream.la(-1), Some('y'));
    assert_eq!(stream.la(-2), Some('x'));
    assert_eq!(stream.la(1), Some('z'));
}

#[test]
fn test_next_and_end_of_input() {
    let mut stream = CharStream::new("t.pxml", "a");
    assert_eq!(stream.next(), 'a' as i32);
    stream.consume().expect("Failed to consume");
    assert_eq!(stream.next(), EOF);
    assert!(stream.is_eof());

    let err = stream.consume().unwrap_err();
    assert_eq!(err, StreamError::EndOfInput { line: 1, column: 2 });
}

#[test]
fn test_surrogate_pair_is_one_character() {
    // "a😀b" in UTF-16
    let units: Vec<u16> = "a😀b".encode_utf16().collect();
    assert_eq!(units.len(), 4);

    let mut stream = CharStream::from_utf16("t.pjson", &units);
    assert_eq!(stream.len(), 3);
    stream.consume().expect("Failed to consume 'a'");
    assert_eq!(stream.consume(), Ok('😀'));
    assert_eq!(stream.column(), 3);
    assert_eq!(stream.la(1), Some('b'));
}

#[test]
fn test_unpaired_surrogate_is_replaced() {
    let units = [0x61u16, 0xD800, 0x62];
    let stream = CharStream::from_utf16("t.pjson", &units);
    assert_eq!(stream.text(0, 3), "a\u{FFFD}b");
}
