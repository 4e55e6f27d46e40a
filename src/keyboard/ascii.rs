//! Compact ASCII-to-`Key` table for `type_str`. One deduplicated
//! table instead of the original's per-platform copies; covers printable
//! ASCII plus backspace/tab/CR/LF.

use super::Key;

/// Maps one ASCII byte to the key that produces it and whether shift must
/// be held. Returns `None` for characters with no keyboard mapping here
/// (e.g. most control characters besides `\b \t \r \n`) — `type_str` skips
/// those rather than erroring.
pub fn lookup(ch: u8) -> Option<(Key, bool)> {
    Some(match ch {
        b'\x08' => (Key::Backspace, false),
        b'\t' => (Key::Tab, false),
        b'\r' | b'\n' => (Key::Enter, false),
        b' ' => (Key::Space, false),

        b'a'..=b'z' => (letter(ch - b'a' + b'A'), false),
        b'A'..=b'Z' => (letter(ch), true),

        b'0' => (Key::Num0, false),
        b'1' => (Key::Num1, false),
        b'2' => (Key::Num2, false),
        b'3' => (Key::Num3, false),
        b'4' => (Key::Num4, false),
        b'5' => (Key::Num5, false),
        b'6' => (Key::Num6, false),
        b'7' => (Key::Num7, false),
        b'8' => (Key::Num8, false),
        b'9' => (Key::Num9, false),

        b'!' => (Key::Num1, true),
        b'@' => (Key::Num2, true),
        b'#' => (Key::Num3, true),
        b'$' => (Key::Num4, true),
        b'%' => (Key::Num5, true),
        b'^' => (Key::Num6, true),
        b'&' => (Key::Num7, true),
        b'*' => (Key::Num8, true),
        b'(' => (Key::Num9, true),
        b')' => (Key::Num0, true),

        b'-' => (Key::Minus, false),
        b'_' => (Key::Minus, true),
        b'=' => (Key::Equals, false),
        b'+' => (Key::Equals, true),
        b'[' => (Key::LeftBracket, false),
        b'{' => (Key::LeftBracket, true),
        b']' => (Key::RightBracket, false),
        b'}' => (Key::RightBracket, true),
        b'\\' => (Key::Backslash, false),
        b'|' => (Key::Backslash, true),
        b';' => (Key::Semicolon, false),
        b':' => (Key::Semicolon, true),
        b'\'' => (Key::Quote, false),
        b'"' => (Key::Quote, true),
        b'`' => (Key::Grave, false),
        b'~' => (Key::Grave, true),
        b',' => (Key::Comma, false),
        b'<' => (Key::Comma, true),
        b'.' => (Key::Period, false),
        b'>' => (Key::Period, true),
        b'/' => (Key::Slash, false),
        b'?' => (Key::Slash, true),

        _ => return None,
    })
}

fn letter(upper_ascii: u8) -> Key {
    use Key::*;
    match upper_ascii {
        b'A' => A, b'B' => B, b'C' => C, b'D' => D, b'E' => E, b'F' => F,
        b'G' => G, b'H' => H, b'I' => I, b'J' => J, b'K' => K, b'L' => L,
        b'M' => M, b'N' => N, b'O' => O, b'P' => P, b'Q' => Q, b'R' => R,
        b'S' => S, b'T' => T, b'U' => U, b'V' => V, b'W' => W, b'X' => X,
        b'Y' => Y, _ => Z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_has_no_shift() {
        assert_eq!(lookup(b'h'), Some((Key::H, false)));
    }

    #[test]
    fn uppercase_needs_shift() {
        assert_eq!(lookup(b'H'), Some((Key::H, true)));
    }

    #[test]
    fn bang_maps_to_shifted_one() {
        assert_eq!(lookup(b'!'), Some((Key::Num1, true)));
    }

    #[test]
    fn unmapped_control_char_is_none() {
        assert_eq!(lookup(0x01), None);
    }
}
