use crate::money::CurrencyUnit;
use rust_decimal::{prelude::ToPrimitive, Decimal};

pub const DEFAULT_BAR_LENGTH: usize = 10;

const FILLED: char = '▓';
const EMPTY: char = '░';

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("fundraising target must be positive, got {0}")]
    InvalidTarget(Decimal),
}

/// Whole percent of `target` reached by `current`, floored and clamped to `0..=100`.
pub fn percent(current: Decimal, target: Decimal) -> Result<u32, Error> {
    if target <= Decimal::ZERO {
        return Err(Error::InvalidTarget(target));
    }
    let ratio = current
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(target))
        .unwrap_or(Decimal::ONE_HUNDRED);
    Ok(ratio
        .floor()
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or(0))
}

pub fn bar(percent: u32, length: usize) -> String {
    let filled = (percent.min(100) as usize * length) / 100;
    let mut bar = String::with_capacity(length * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(length - filled));
    bar
}

/// Renders e.g. `[▓▓▓░░░░░░░] 30%  Raised: 300.00 ₾ of 1000.00 ₾`.
pub fn render(
    current: Decimal,
    target: Decimal,
    bar_length: usize,
    unit: &CurrencyUnit,
) -> Result<String, Error> {
    let percent = percent(current, target)?;
    Ok(format!(
        "[{}] {}%  Raised: {} of {}",
        bar(percent, bar_length),
        percent,
        unit.format(current),
        unit.format(target)
    ))
}
