//! Number format codes: date detection and text rendering
//!
//! Rendering is pinned to an en-US policy: `.` is the decimal separator and
//! `,` the grouping separator, whatever the locale of the host.

/// Get the format code for a built-in number format ID.
///
/// Returns `None` if the ID is not a recognized built-in format.
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Check if a format code displays its value as a date or time.
///
/// Only the first section is inspected. Elapsed-time codes such as
/// `[h]:mm:ss` count as date formats.
pub fn is_date_format(format: &str) -> bool {
    let mut escaped = false;
    let mut is_quote = false;
    let mut brackets = 0u8;
    let mut prev = ' ';
    let mut hms = false;
    let mut ap = false;

    for s in format.chars() {
        match (s, escaped, is_quote, ap, brackets) {
            (_, true, ..) => escaped = false,
            ('_' | '\\', ..) => escaped = true,
            ('"', _, true, _, _) => is_quote = false,
            (_, _, true, _, _) => (),
            ('"', _, _, _, _) => is_quote = true,
            (';', ..) => return false,
            ('[', ..) => brackets += 1,
            (']', .., 1) if hms => return true,
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => ap = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => return true,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return true;
            }
            _ => {
                if !(hms && s.eq_ignore_ascii_case(&prev)) {
                    hms = prev == '[' && matches!(s, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            }
        }
        prev = s;
    }
    false
}

/// Render a number with Excel's "General" format
///
/// Whole numbers print without a fraction, other values are rounded to ten
/// significant digits, and very large or very small magnitudes switch to
/// scientific notation with up to five mantissa decimals.
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if abs >= 1e11 || abs <= 1e-10 {
        return general_scientific(value);
    }
    if value.fract() == 0.0 || abs >= 1e10 {
        return format!("{:.0}", value);
    }

    let magnitude = abs.log10().floor() as i32 + 1;
    let decimals = (10 - magnitude).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value))
}

fn general_scientific(value: f64) -> String {
    let formatted = format!("{:.5e}", value);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
}

fn trim_fraction(number: &str) -> String {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        number.to_string()
    }
}

/// Render a number with an Excel number format code
///
/// Supports sections (`pos;neg;zero`), colour, condition and locale
/// brackets, currency brackets (`[$€-407]`), quoted and escaped literals,
/// padding (`_x`) and fill (`*x`) markers, percent, thousands grouping and
/// trailing-comma scaling, fixed (`0`) and optional (`#`, `?`) digits,
/// scientific notation, `General` and `@`. Fraction codes fall back to
/// General rendering. Date codes must be handled by the caller.
pub fn format_number(value: f64, code: &str) -> String {
    let code = code.trim();
    if !value.is_finite() || code.is_empty() || code.eq_ignore_ascii_case("general") {
        return format_general(value);
    }

    let sections = split_sections(code);
    let (section, number, signed) = if value < 0.0 && sections.len() >= 2 {
        (sections[1].as_str(), value.abs(), false)
    } else if value == 0.0 && sections.len() >= 3 {
        (sections[2].as_str(), 0.0, false)
    } else {
        (sections[0].as_str(), value.abs(), value < 0.0)
    };

    let rendered = render_section(&tokenize(section), number);
    if signed {
        format!("-{}", rendered)
    } else {
        rendered
    }
}

/// Split a format code on `;`, ignoring separators inside quotes, brackets
/// or after an escape
fn split_sections(code: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut in_bracket = false;
    let mut escaped = false;

    for ch in code.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        match ch {
            '\\' if !in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            ';' if !in_quote && !in_bracket => {
                sections.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    sections.push(current);
    sections
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    /// `0`, `#` or `?`
    Digit(char),
    Point,
    Comma,
    Percent,
    Exponent { show_plus: bool },
    Fraction,
    General,
    Text,
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' => {
                let literal: String = chars[i + 1..].iter().take_while(|c| **c != '"').collect();
                i += literal.chars().count() + 2;
                tokens.push(Token::Literal(literal));
                continue;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    tokens.push(Token::Literal(next.to_string()));
                }
                i += 2;
                continue;
            }
            '_' => {
                tokens.push(Token::Literal(" ".to_string()));
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            '[' => {
                let content: String = chars[i + 1..].iter().take_while(|c| **c != ']').collect();
                i += content.chars().count() + 2;
                // Currency/locale: [$€-407] shows "€"; colours and conditions show nothing
                if let Some(currency) = content.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or_default();
                    if !symbol.is_empty() {
                        tokens.push(Token::Literal(symbol.to_string()));
                    }
                }
                continue;
            }
            '0' | '#' | '?' => tokens.push(Token::Digit(ch)),
            '.' => tokens.push(Token::Point),
            ',' => tokens.push(Token::Comma),
            '%' => tokens.push(Token::Percent),
            '/' => tokens.push(Token::Fraction),
            '@' => tokens.push(Token::Text),
            'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                tokens.push(Token::Exponent {
                    show_plus: chars[i + 1] == '+',
                });
                i += 2;
                continue;
            }
            'G' | 'g' => {
                let word: String = chars[i..].iter().take(7).collect();
                if word.eq_ignore_ascii_case("general") {
                    tokens.push(Token::General);
                    i += 7;
                    continue;
                }
                tokens.push(Token::Literal(ch.to_string()));
            }
            _ => tokens.push(Token::Literal(ch.to_string())),
        }
        i += 1;
    }

    tokens
}

/// Layout of the digit placeholders of one section
#[derive(Debug, Default)]
struct NumberLayout {
    int_zeros: usize,
    int_digits: usize,
    int_has_optional: bool,
    frac_zeros: usize,
    frac_digits: usize,
    has_point: bool,
    grouping: bool,
    scale_thousands: i32,
    percent: i32,
    exponent: Option<(bool, usize)>,
}

impl NumberLayout {
    fn from_tokens(tokens: &[Token]) -> Self {
        let mut layout = NumberLayout::default();
        let mut in_fraction = false;
        let mut in_exponent = false;
        let mut exponent_zeros = 0;

        for (idx, token) in tokens.iter().enumerate() {
            match token {
                Token::Digit(d) if in_exponent => {
                    if *d == '0' {
                        exponent_zeros += 1;
                    }
                }
                Token::Digit(d) if in_fraction => {
                    layout.frac_digits += 1;
                    if *d == '0' {
                        layout.frac_zeros += 1;
                    }
                }
                Token::Digit(d) => {
                    layout.int_digits += 1;
                    if *d == '0' {
                        layout.int_zeros += 1;
                    } else {
                        layout.int_has_optional = true;
                    }
                }
                Token::Point if !in_exponent && !in_fraction => {
                    in_fraction = true;
                    layout.has_point = true;
                }
                Token::Comma if !in_exponent => {
                    let after_digit = tokens[..idx]
                        .iter()
                        .rev()
                        .find(|t| **t != Token::Comma)
                        .is_some_and(|t| matches!(t, Token::Digit(_)));
                    let before_digit = matches!(tokens.get(idx + 1), Some(Token::Digit(_)));
                    if after_digit && before_digit && !in_fraction {
                        layout.grouping = true;
                    } else if after_digit && !before_digit {
                        layout.scale_thousands += 1;
                    }
                }
                Token::Percent => layout.percent += 1,
                Token::Exponent { show_plus } => {
                    in_exponent = true;
                    layout.exponent = Some((*show_plus, 0));
                }
                _ => {}
            }
        }

        if let Some((show_plus, _)) = layout.exponent {
            layout.exponent = Some((show_plus, exponent_zeros));
        }
        layout
    }

    fn render(&self, number: f64) -> String {
        let scaled = number * 100f64.powi(self.percent) / 1000f64.powi(self.scale_thousands);
        match self.exponent {
            Some((show_plus, exponent_zeros)) => {
                let (mantissa, exponent) = self.split_scientific(scaled);
                let sign = if exponent < 0 {
                    "-"
                } else if show_plus {
                    "+"
                } else {
                    ""
                };
                format!(
                    "{}E{}{:0width$}",
                    self.render_fixed(mantissa, false),
                    sign,
                    exponent.abs(),
                    width = exponent_zeros.max(1)
                )
            }
            None => self.render_fixed(scaled, self.grouping),
        }
    }

    fn split_scientific(&self, number: f64) -> (f64, i32) {
        if number == 0.0 {
            return (0.0, 0);
        }
        // "##0.0E+0" keeps the exponent a multiple of the integer width
        let step = if self.int_has_optional && self.int_digits > 1 {
            self.int_digits as i32
        } else {
            1
        };
        let shift = if step == 1 {
            self.int_zeros.max(1) as i32 - 1
        } else {
            0
        };

        let mut exponent = number.log10().floor() as i32 - shift;
        exponent -= exponent.rem_euclid(step);
        let mut mantissa = number / 10f64.powi(exponent);

        let limit = 10f64.powi(if step == 1 { shift + 1 } else { step });
        let rounded: f64 = format!("{:.*}", self.frac_digits, mantissa)
            .parse()
            .unwrap_or(mantissa);
        if rounded >= limit {
            exponent += step;
            mantissa = number / 10f64.powi(exponent);
        }
        (mantissa, exponent)
    }

    fn render_fixed(&self, number: f64, grouping: bool) -> String {
        let rounded = format!("{:.*}", self.frac_digits, number);
        let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

        let mut frac = frac_part.to_string();
        while frac.len() > self.frac_zeros && frac.ends_with('0') {
            frac.pop();
        }

        let significant = int_part.trim_start_matches('0');
        let mut int = String::new();
        if significant.len() < self.int_zeros {
            int.push_str(&"0".repeat(self.int_zeros - significant.len()));
        }
        int.push_str(significant);
        if grouping {
            int = group_thousands(&int);
        }

        if self.has_point {
            format!("{}.{}", int, frac)
        } else {
            int
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a non-negative number with the tokens of one section
fn render_section(tokens: &[Token], number: f64) -> String {
    let has_digits = tokens.iter().any(|t| matches!(t, Token::Digit(_)));

    if tokens.contains(&Token::Fraction) && has_digits {
        return format_general(number);
    }

    let mut out = String::new();
    if !has_digits {
        for token in tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::General | Token::Text => out.push_str(&format_general(number)),
                Token::Percent => out.push('%'),
                Token::Point => out.push('.'),
                Token::Comma => out.push(','),
                Token::Fraction => out.push('/'),
                _ => {}
            }
        }
        return out;
    }

    let layout = NumberLayout::from_tokens(tokens);
    let mut number_written = false;
    for token in tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Percent => out.push('%'),
            Token::Digit(_) if !number_written => {
                out.push_str(&layout.render(number));
                number_written = true;
            }
            _ => {}
        }
    }
    out
}
