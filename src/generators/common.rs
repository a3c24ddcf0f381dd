//! Common utilities for document generation.
//!
//! Shared helpers for file naming, number formatting and text wrapping.

/// Replace every ASCII space with an underscore.
///
/// Nothing else is normalized: case, punctuation and other whitespace
/// characters pass through unchanged.
pub fn sanitize_party_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Derive the stored file name for a seller/buyer pair.
pub fn derive_file_name(seller: &str, buyer: &str) -> String {
    format!(
        "{}_{}.pdf",
        sanitize_party_name(seller),
        sanitize_party_name(buyer)
    )
}

/// Format a monetary value the way a double prints by default.
///
/// Magnitudes in `[1e-3, 1e7)` print as plain decimals, anything else in
/// scientific notation (`1.0E7`, `1.5E-4`). The mantissa always carries a
/// fraction digit, so `10` renders as `10.0`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return with_fraction(value.to_string());
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            format!("{}E{}", with_fraction(mantissa.to_string()), exponent)
        }
        None => scientific,
    }
}

fn with_fraction(mut digits: String) -> String {
    if !digits.contains('.') {
        digits.push_str(".0");
    }
    digits
}

/// Greedy word wrap on a character budget.
///
/// Explicit newlines always break. Words longer than the budget are split.
/// An empty input yields a single empty line so rows keep their height.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };

            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}
