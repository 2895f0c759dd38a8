/// Turns numeric values into display text. The renderer never formats numbers itself.
pub trait ValueFormatter {
    fn format(&self, value: f64) -> String;
}

impl<F> ValueFormatter for F
where
    F: Fn(f64) -> String,
{
    fn format(&self, value: f64) -> String {
        self(value)
    }
}

/// Fixed decimals with `,` thousands grouping and an optional unit suffix
/// (`1234.4` -> `"1,234 EUR"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedFormatter {
    pub decimals: usize,
    pub units: Option<String>,
}

impl GroupedFormatter {
    pub fn new(units: Option<String>) -> Self {
        Self { decimals: 0, units }
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }
}

impl ValueFormatter for GroupedFormatter {
    fn format(&self, value: f64) -> String {
        let number = group_thousands(value, self.decimals);
        match self.units.as_deref() {
            Some(units) if !units.is_empty() => format!("{number} {units}"),
            _ => number,
        }
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
