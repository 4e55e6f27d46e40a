//! Scan Code Set 2 make/break codes for a MF-II keyboard layout. Covers the
//! alphanumeric block, the top row, punctuation, and the common control/
//! navigation keys — the set `type_str` and hand-authored key sequences
//! actually need, not an exhaustive 104-key table.

/// One logical key. Variant names follow the MF-II legend, not the ASCII
/// character it might produce when typed (see [`crate::keyboard::ascii`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    Minus,
    Equals,
    LeftBracket,
    RightBracket,
    Backslash,
    Semicolon,
    Quote,
    Grave,
    Comma,
    Period,
    Slash,
    LShift,
    RShift,
    LCtrl,
    LAlt,
    CapsLock,
}

/// Scan Code Set 2 make code, one to two bytes.
pub fn make_code(key: Key) -> &'static [u8] {
    use Key::*;
    match key {
        A => &[0x1C], B => &[0x32], C => &[0x21], D => &[0x23], E => &[0x24],
        F => &[0x2B], G => &[0x34], H => &[0x33], I => &[0x43], J => &[0x3B],
        K => &[0x42], L => &[0x4B], M => &[0x3A], N => &[0x31], O => &[0x44],
        P => &[0x4D], Q => &[0x15], R => &[0x2D], S => &[0x1B], T => &[0x2C],
        U => &[0x3C], V => &[0x2A], W => &[0x1D], X => &[0x22], Y => &[0x35],
        Z => &[0x1A],
        Num0 => &[0x45], Num1 => &[0x16], Num2 => &[0x1E], Num3 => &[0x26],
        Num4 => &[0x25], Num5 => &[0x2E], Num6 => &[0x36], Num7 => &[0x3D],
        Num8 => &[0x3E], Num9 => &[0x46],
        Enter => &[0x5A],
        Escape => &[0x76],
        Backspace => &[0x66],
        Tab => &[0x0D],
        Space => &[0x29],
        Minus => &[0x4E],
        Equals => &[0x55],
        LeftBracket => &[0x54],
        RightBracket => &[0x5B],
        Backslash => &[0x5D],
        Semicolon => &[0x4C],
        Quote => &[0x52],
        Grave => &[0x0E],
        Comma => &[0x41],
        Period => &[0x49],
        Slash => &[0x4A],
        LShift => &[0x12],
        RShift => &[0x59],
        LCtrl => &[0x14],
        LAlt => &[0x11],
        CapsLock => &[0x58],
    }
}

/// Scan Code Set 2 break code: `0xF0` followed by the make code's bytes.
/// Cheap to derive rather than tabulate twice — the original firmware keeps
/// two parallel tables, but Set 2 break codes are defined as this prefix
/// uniformly (no two-byte make code in this table has an extended `0xE0`
/// lead, so there's nothing else to special-case).
pub fn break_code(key: Key) -> [u8; 2] {
    let make = make_code(key);
    [0xF0, make[0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_and_break_agree_on_payload_byte() {
        let make = make_code(Key::H);
        let brk = break_code(Key::H);
        assert_eq!(brk[1], make[0]);
        assert_eq!(brk[0], 0xF0);
    }

    #[test]
    fn digits_and_letters_are_distinct() {
        assert_ne!(make_code(Key::Num1), make_code(Key::Q));
    }
}
