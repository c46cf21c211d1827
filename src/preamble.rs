//! Detection of a banner block in front of the data.

use crate::encoding::bom_len;

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Estimated length in bytes of the preamble: everything up to and including
/// the last empty line that is followed by data.
///
/// A line is empty when it holds only spaces and tabs. Trailing empty lines
/// at the end of the sample do not count. A UTF-8 BOM is always part of the
/// preamble.
///
/// ```
/// assert_eq!(csv_scout::preamble_len(b"Report 2024\n\na,b\n1,2\n"), 13);
/// assert_eq!(csv_scout::preamble_len(b"a,b\n1,2\n"), 0);
/// ```
pub fn preamble_len(data: &[u8]) -> usize {
    let bom = bom_len(data);
    let data = &data[bom..];

    let Some(last) = data
        .iter()
        .rposition(|&b| !matches!(b, b'\n' | b'\r' | b' ' | b'\t'))
    else {
        return bom;
    };

    // scanning backward, `line_start` is the offset after the latest line feed
    let mut in_empty_line = false;
    let mut line_start = last + 1;
    for i in (0..=last).rev() {
        match data[i] {
            b'\n' if in_empty_line => return line_start + bom,
            b'\n' => {
                in_empty_line = true;
                line_start = i + 1;
            }
            b if !is_blank(b) => in_empty_line = false,
            _ => {}
        }
    }
    if in_empty_line { line_start + bom } else { bom }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_len() {
        let cases: &[(&[u8], usize)] = &[
            (b"", 0),
            (b"a,b,c\nd,e,f\n", 0),
            (b"a,b,c\nd,e,f\n\n\n", 0),
            (b"a,b,c\nd,e,f\n\t\n \n", 0),
            (b"a,b,c\n\nd,e,f\n", 7),
            (b" \t \na,b,c\nd,e,f\n", 4),
            (b"a,b,c\n\nd,e,f\n\ng", 14),
            (b"\xEF\xBB\xBF\na,b,c\nd,e,f\n.", 4),
            (b"\xEF\xBB\xBF \t \na,b,c\nd,e,f\n.", 7),
            (b"\xEF\xBB\xBFa,b,c\n\nd,e,f\n.", 10),
            (b"\xFE\xFF\na,b,c\nd,e,f\n.", 0),
            (b"\xEF\xBB\xBF", 3),
            (b"\n\n  \n", 0),
        ];
        for (data, want) in cases {
            assert_eq!(
                preamble_len(data),
                *want,
                "preamble of {:?}",
                String::from_utf8_lossy(data)
            );
        }
    }
}
