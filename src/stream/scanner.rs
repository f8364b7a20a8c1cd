use super::*;

pub(super) fn lookahead(stream: &CharStream, i: isize) -> Option<char> {
    if i == 0 {
        return None;
    }
    let target = if i > 0 {
        stream.index.checked_add((i - 1) as usize)?
    } else {
        stream.index.checked_sub(i.unsigned_abs())?
    };
    stream.data.get(target).copied()
}

/// Advance the cursor and update line/column tracking
pub(super) fn consume(stream: &mut CharStream) -> Result<char, StreamError> {
    let curr = stream.data.get(stream.index).copied().ok_or(StreamError::EndOfInput {
        line: stream.line,
        column: stream.column,
    })?;
    stream.index += 1;

    match curr {
        '\n' => {
            stream.line += 1;
            stream.column = 1;
            Ok('\n')
        }
        '\r' => {
            // CRLF is one line break; a lone CR takes no column
            if stream.data.get(stream.index) == Some(&'\n') {
                stream.index += 1;
                stream.line += 1;
                stream.column = 1;
                Ok('\n')
            } else {
                Ok('\r')
            }
        }
        c => {
            stream.column += 1;
            Ok(c)
        }
    }
}
