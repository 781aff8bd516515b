const COMPACT_UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    symbol: String,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new("£")
    }
}

impl CurrencyFormatter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn format(&self, value: f64) -> String {
        let rounded = value.round();
        let sign = if rounded < 0.0 { "-" } else { "" };
        format!("{sign}{}{}", self.symbol, group_thousands(rounded.abs()))
    }

    pub fn format_compact(&self, value: f64) -> String {
        let magnitude = value.abs();
        let sign = if value < 0.0 && magnitude.round() > 0.0 {
            "-"
        } else {
            ""
        };

        for (idx, (unit, suffix)) in COMPACT_UNITS.iter().enumerate() {
            if magnitude < *unit {
                continue;
            }
            let scaled = round_compact(magnitude / unit);
            // 999_999 rounds to 1000K; promote it to the next unit.
            if scaled >= 1000.0 && idx > 0 {
                let (larger_unit, larger_suffix) = COMPACT_UNITS[idx - 1];
                let promoted = round_compact(magnitude / larger_unit);
                return format!("{sign}{}{}{larger_suffix}", self.symbol, trim(promoted));
            }
            return format!("{sign}{}{}{suffix}", self.symbol, trim(scaled));
        }

        if magnitude.round() >= 1000.0 {
            return format!("{sign}{}1K", self.symbol);
        }
        format!("{sign}{}{}", self.symbol, group_thousands(magnitude.round()))
    }
}

fn round_compact(scaled: f64) -> f64 {
    if scaled < 10.0 {
        (scaled * 10.0).round() / 10.0
    } else {
        scaled.round()
    }
}

fn trim(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn group_thousands(whole: f64) -> String {
    let digits = format!("{whole:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
