//! Lenient number readers for query-string values.
//!
//! Both readers skip leading whitespace and read the longest numeric prefix,
//! ignoring whatever follows (`"12abc"` reads as 12). A value without a
//! numeric prefix reads as `None`.

/// Read a leading base-10 integer.
pub fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let sign = sign_len(bytes);
    let digits = count_digits(&bytes[sign..]);
    if digits == 0 {
        return None;
    }

    s[..sign + digits].parse().ok()
}

/// Read a leading decimal number with optional fraction and exponent.
pub fn leading_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let mut end = sign_len(bytes);
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_start = end + 1;
        let exp_sign = sign_len(&bytes[exp_start..]);
        let exp_digits = count_digits(&bytes[exp_start + exp_sign..]);
        if exp_digits > 0 {
            end = exp_start + exp_sign + exp_digits;
        }
    }

    s[..end].parse().ok()
}

fn sign_len(bytes: &[u8]) -> usize {
    usize::from(matches!(bytes.first(), Some(b'+' | b'-')))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
