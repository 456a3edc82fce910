//! CNPJ (Brazilian legal-entity identifier) normalization and check digits.

const CNPJ_LEN: usize = 14;
const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Keeps only the ASCII digits of `raw`.
///
/// Daily reports and operators write the same identifier either as
/// `00.017.024/0001-53` or `00017024000153`; every comparison goes through
/// this function.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Returns true when `raw` holds exactly 14 digits (punctuation ignored)
/// whose last two match the CNPJ check digits.
pub fn is_valid(raw: &str) -> bool {
    let numbers: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if numbers.len() != CNPJ_LEN {
        return false;
    }

    let mut expected = numbers[..12].to_vec();
    expected.push(check_digit(&expected, &FIRST_WEIGHTS));
    expected.push(check_digit(&expected, &SECOND_WEIGHTS));

    numbers == expected
}

/// Renders a 14-digit identifier as `NN.NNN.NNN/NNNN-NN`.
pub fn format(raw: &str) -> Option<String> {
    let d = digits(raw);
    if d.len() != CNPJ_LEN {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    ))
}

/// Weighted mod-11 check digit over `numbers`, position-aligned with `weights`.
fn check_digit(numbers: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = numbers.iter().zip(weights).map(|(n, w)| n * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}
