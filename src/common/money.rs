// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Casas decimais de todo valor monetário persistido (NUMERIC(12,2)).
pub const MONEY_SCALE: u32 = 2;

/// Arredondamento único do sistema. Qualquer cálculo de imposto passa por aqui.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `base * rate / 100`, arredondado.
pub fn percent_of(base: Decimal, rate: Decimal) -> Decimal {
    round_money(base * rate / Decimal::ONE_HUNDRED)
}
