use nom::{
    bytes::complete::{take_while1, take_while_m_n},
    character::complete::{alpha1, char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, verify},
    sequence::{pair, preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{MinorUnits, Period, PeriodUnit};


/// One chat line split into its positional parts. Slots are not yet given a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub amount: MinorUnits,
    pub installments: u32,
    pub slots: [Option<String>; 3],
}

impl ParsedCommand {
    pub fn filled_slots(&self) -> Vec<&str> {
        self.slots.iter().map_while(|s| s.as_deref()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
}

fn linespace1(i: &str) -> IResult<&str, &str> {
    take_while1(move |c| " \t".contains(c))(i)
}

fn fraction(i: &str) -> IResult<&str, &str> {
    preceded(char('.'), take_while_m_n(0, 2, |c: char| c.is_ascii_digit()))(i)
}

fn to_minor_units(sign: Option<char>, whole: &str, fraction: Option<&str>) -> Option<MinorUnits> {
    let whole: i64 = whole.parse().ok()?;
    let cents: i64 = match fraction.unwrap_or("") {
        "" => 0,
        f if f.len() == 1 => f.parse::<i64>().ok()? * 10,
        f => f.parse().ok()?,
    };
    let magnitude = whole.checked_mul(100)?.checked_add(cents)?;

    // Expenses are far more common than income, so an unsigned amount is an expense.
    let sign = match sign {
        Some('+') => Sign::Positive,
        _ => Sign::Negative,
    };

    Some(match sign {
        Sign::Positive => MinorUnits(magnitude),
        Sign::Negative => MinorUnits(-magnitude),
    })
}

fn numeric_literal(i: &str) -> IResult<&str, MinorUnits> {
    map_res(
        tuple((opt(one_of("+-")), digit1, opt(fraction))),
        |(sign, whole, fraction)| to_minor_units(sign, whole, fraction).ok_or("amount overflow"),
    )(i)
}

fn installment_count(i: &str) -> IResult<&str, u32> {
    verify(
        map_res(preceded(char('/'), digit1), |n: &str| n.parse::<u32>()),
        |n: &u32| *n > 0,
    )(i)
}

fn slot(i: &str) -> IResult<&str, String> {
    map(
        take_while1(move |c: char| c.is_alphanumeric() || "-_.".contains(c)),
        |s: &str| s.to_owned(),
    )(i)
}

// Each slot is only reachable through the one before it.
fn slots(i: &str) -> IResult<&str, [Option<String>; 3]> {
    map(
        opt(pair(
            preceded(linespace1, slot),
            opt(pair(
                preceded(linespace1, slot),
                opt(preceded(linespace1, slot)),
            )),
        )),
        |parsed| match parsed {
            None => [None, None, None],
            Some((first, None)) => [Some(first), None, None],
            Some((first, Some((second, third)))) => [Some(first), Some(second), third],
        },
    )(i)
}

fn command(i: &str) -> IResult<&str, ParsedCommand> {
    map(
        tuple((numeric_literal, opt(installment_count), slots)),
        |(amount, installments, slots)| ParsedCommand {
            amount,
            installments: installments.unwrap_or(1),
            slots,
        },
    )(i)
}

/// Matches `<amount>[/<months>][ <slot0>][ <slot1>][ <slot2>]` against the whole line.
pub fn parse_command(line: &str) -> Result<ParsedCommand> {
    let (_, parsed) = all_consuming(command)(line.trim())
        .map_err(|_| Error::GrammarMismatch(line.to_owned()))?;

    debug!(?parsed, "parsed");

    Ok(parsed)
}

pub fn parse_amount(text: &str) -> Result<MinorUnits> {
    let (_, amount) = all_consuming(numeric_literal)(text.trim())
        .map_err(|_| Error::GrammarMismatch(text.to_owned()))?;
    Ok(amount)
}

pub fn parse_name(text: &str) -> Result<String> {
    let (_, name) = all_consuming(slot)(text.trim())
        .map_err(|_| Error::GrammarMismatch(text.to_owned()))?;
    Ok(name)
}

fn period(i: &str) -> IResult<&str, Period> {
    map_res(
        pair(
            verify(map_res(digit1, |n: &str| n.parse::<u32>()), |n: &u32| *n > 0),
            alpha1,
        ),
        |(count, unit)| unit.parse::<PeriodUnit>().map(|unit| Period::new(count, unit)),
    )(i)
}

/// Periods such as `1month`, `2weeks` or `1year`.
pub fn parse_period(text: &str) -> Result<Period> {
    let (_, period) =
        all_consuming(period)(text.trim()).map_err(|_| Error::GrammarMismatch(text.to_owned()))?;
    Ok(period)
}
