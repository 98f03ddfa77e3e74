//! Payment claim parsing.
//!
//! Users describe a transfer in free text, in one of two layouts:
//!
//! ```text
//! #โอน ฝ้าย 83 2 ม.ค. 68 - ก.พ. 68 KBank 26 ม.ค. 68 10:30
//! ```
//!
//! ```text
//! #โอน
//! ฝ้าย
//! 83
//! 2
//! ม.ค. 68 - ก.พ. 68
//! ```
//!
//! The inline layout additionally names the bank and the transfer date/time. Parsing
//! returns a [`Claim`] or the specific [`ClaimError`] for the first offending field.

use crate::core::period::{canonical_year, month_from_abbreviation, validate_billing_period};
use crate::errors::ClaimError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Keyword that opens a claim message.
pub const CLAIM_KEYWORD: &str = "#โอน";

/// Banks accepted when no whitelist is configured.
pub const DEFAULT_BANKS: [&str; 8] = [
    "KBank",
    "SCB",
    "KTB",
    "BBL",
    "TrueWallet",
    "TTB",
    "BAY",
    "GSB",
];

/// Upper bound on months a single claim may cover.
pub const MAX_MONTHS: u32 = 120;

#[allow(clippy::unwrap_used)]
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$").unwrap());

/// A structurally valid payment claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Nickname the user typed; checked against the registration later
    pub nickname: String,
    /// Amount transferred
    pub amount: f64,
    /// Number of billing months covered
    pub months: u32,
    /// Billing period phrase as written
    pub billing_period: String,
    /// Bank and transfer time, present in the inline layout only
    pub transfer: Option<TransferDetails>,
}

/// Bank transfer details from the inline layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDetails {
    /// Bank name in its whitelist spelling
    pub bank: String,
    /// Transfer date
    pub date: NaiveDate,
    /// Time as written, `H:MM` or `H:MM:SS`
    pub time: String,
    /// Day, month, year and time exactly as the user wrote them
    pub written: String,
}

/// Parses claim text against a bank whitelist.
#[derive(Debug, Clone, Copy)]
pub struct ClaimParser<'a> {
    banks: &'a [String],
    current_year: i32,
}

impl<'a> ClaimParser<'a> {
    /// `current_year` fills in billing months written without a year.
    #[must_use]
    pub const fn new(banks: &'a [String], current_year: i32) -> Self {
        Self {
            banks,
            current_year,
        }
    }

    /// Parses either layout, then checks the billing period against the month count.
    pub fn parse(&self, text: &str) -> Result<Claim, ClaimError> {
        let body = strip_keyword(text);
        let lines: Vec<&str> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let claim = if lines.len() > 1 {
            parse_lines(&lines)?
        } else {
            self.parse_inline(body)?
        };

        validate_billing_period(&claim.billing_period, claim.months, self.current_year)?;
        Ok(claim)
    }

    fn parse_inline(&self, body: &str) -> Result<Claim, ClaimError> {
        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(ClaimError::MissingFields);
        }

        // The bank is searched after the months token so a nickname can never match.
        let (bank_index, bank) = tokens
            .iter()
            .enumerate()
            .skip(3)
            .find_map(|(index, token)| self.match_bank(token).map(|bank| (index, bank)))
            .ok_or_else(|| ClaimError::UnknownBank {
                supported: self.banks.join(", "),
            })?;
        if bank_index == 3 {
            return Err(ClaimError::MissingBillingPeriod);
        }

        let amount = parse_amount(tokens[1])?;
        let months = parse_months(tokens[2])?;
        let billing_period = tokens[3..bank_index].join(" ");
        let transfer = parse_transfer(bank, &tokens[bank_index + 1..])?;

        Ok(Claim {
            nickname: tokens[0].to_string(),
            amount,
            months,
            billing_period,
            transfer: Some(transfer),
        })
    }

    fn match_bank(&self, token: &str) -> Option<&'a str> {
        self.banks
            .iter()
            .find(|bank| bank.eq_ignore_ascii_case(token))
            .map(String::as_str)
    }
}

fn parse_lines(lines: &[&str]) -> Result<Claim, ClaimError> {
    let [nickname, amount, months, billing, ..] = lines else {
        return Err(ClaimError::MissingFields);
    };

    Ok(Claim {
        nickname: (*nickname).to_string(),
        amount: parse_amount(amount)?,
        months: parse_months(months)?,
        billing_period: (*billing).to_string(),
        transfer: None,
    })
}

fn strip_keyword(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed.strip_prefix(CLAIM_KEYWORD).unwrap_or(trimmed)
}

fn parse_amount(token: &str) -> Result<f64, ClaimError> {
    let invalid = || ClaimError::InvalidAmount {
        value: token.to_string(),
    };
    let amount: f64 = token.parse().map_err(|_| invalid())?;
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(invalid())
    }
}

fn parse_months(token: &str) -> Result<u32, ClaimError> {
    match token.parse::<u32>() {
        Ok(months) if (1..=MAX_MONTHS).contains(&months) => Ok(months),
        _ => Err(ClaimError::InvalidMonthCount {
            value: token.to_string(),
        }),
    }
}

fn parse_transfer(bank: &str, parts: &[&str]) -> Result<TransferDetails, ClaimError> {
    let [day, month, year, time] = parts else {
        return Err(ClaimError::InvalidTransferDateTime);
    };

    let month_index =
        month_from_abbreviation(month).ok_or_else(|| ClaimError::InvalidTransferMonth {
            value: (*month).to_string(),
        })?;

    let calendar_year = Some(*year)
        .filter(|y| matches!(y.len(), 2 | 4) && y.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|y| y.parse::<u32>().ok())
        .and_then(canonical_year)
        .ok_or_else(|| ClaimError::InvalidTransferYear {
            value: (*year).to_string(),
        })?;

    let date = day
        .parse::<u32>()
        .ok()
        .and_then(|d| NaiveDate::from_ymd_opt(calendar_year, month_index, d))
        .ok_or_else(|| ClaimError::InvalidTransferDay {
            value: (*day).to_string(),
        })?;

    if !is_valid_time(time) {
        return Err(ClaimError::InvalidTransferTime {
            value: (*time).to_string(),
        });
    }

    Ok(TransferDetails {
        bank: bank.to_string(),
        date,
        time: (*time).to_string(),
        written: parts.join(" "),
    })
}

fn is_valid_time(text: &str) -> bool {
    let Some(caps) = TIME_RE.captures(text) else {
        return false;
    };
    let field = |index: usize| {
        caps.get(index)
            .map_or(Some(0), |m| m.as_str().parse::<u32>().ok())
    };
    matches!(
        (field(1), field(2), field(3)),
        (Some(h), Some(m), Some(s)) if h < 24 && m < 60 && s < 60
    )
}
