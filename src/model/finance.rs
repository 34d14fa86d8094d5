//! The data slices returned by the transaction API.

use crate::model::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Totals for one month as reported by `spending/monthly/{month}`.
///
/// The API omits fields it has no data for, so both totals are optional on the wire and read as
/// zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    #[serde(default)]
    total_amount: Option<Amount>,
    #[serde(default)]
    total_income: Option<Amount>,
}

impl SpendingSummary {
    pub fn new(total_amount: Option<Amount>, total_income: Option<Amount>) -> Self {
        Self {
            total_amount,
            total_income,
        }
    }

    /// Total spent in the month, zero if the API did not report it.
    pub fn total_spent(&self) -> Amount {
        self.total_amount.unwrap_or(Amount::ZERO)
    }

    /// Total income in the month, zero if the API did not report it.
    pub fn total_income(&self) -> Amount {
        self.total_income.unwrap_or(Amount::ZERO)
    }
}

/// One row of the top spending categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub name: String,
    pub amount: Amount,
}

impl CategorySpend {
    pub fn new(name: impl Into<String>, amount: Amount) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// The top-N spending categories for a month, largest first. The API owns the ordering and the
/// bound; this type keeps whatever order it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBreakdown(Vec<CategorySpend>);

impl CategoryBreakdown {
    pub fn new(categories: Vec<CategorySpend>) -> Self {
        Self(categories)
    }

    pub fn categories(&self) -> &[CategorySpend] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Current balances per account, kept as the API sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountBalances(Value);

impl AccountBalances {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// One row per account, whichever shape the API used:
    ///
    /// - a map of account name to balance: `{"Checking": 5230.12}`
    /// - a map of account name to account object: `{"checking": {"balance": 5230.12}}`
    /// - a list of account objects: `[{"name": "Checking", "balance": 5230.12}]`, at the top level
    ///   or under a key such as `accounts`
    ///
    /// Other fields, such as an `asOf` date, are ignored. An account without a balance gets a
    /// `null` balance.
    pub fn rows(&self) -> Vec<BalanceRow> {
        match &self.0 {
            Value::Object(map) => map
                .iter()
                .flat_map(|(key, value)| match value {
                    Value::Array(items) => account_rows(items),
                    Value::Object(_) => account_row(value, key).into_iter().collect(),
                    Value::Number(_) => vec![BalanceRow {
                        name: key.clone(),
                        balance: value.clone(),
                    }],
                    Value::String(s) if Amount::from_str(s).is_ok() => vec![BalanceRow {
                        name: key.clone(),
                        balance: value.clone(),
                    }],
                    _ => Vec::new(),
                })
                .collect(),
            Value::Array(items) => account_rows(items),
            _ => Vec::new(),
        }
    }
}

/// Budget versus actual figures for one month, kept as the API sent them. The monthly report does
/// not include them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetStatus(Value);

impl BudgetStatus {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// A single account as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRow {
    pub name: String,
    pub balance: Value,
}

fn account_rows(items: &[Value]) -> Vec<BalanceRow> {
    items
        .iter()
        .filter_map(|item| account_row(item, ""))
        .collect()
}

fn account_row(account: &Value, default_name: &str) -> Option<BalanceRow> {
    let fields = account.as_object()?;
    let name = match fields.get("name") {
        Some(Value::String(name)) => name.clone(),
        _ => default_name.to_string(),
    };
    Some(BalanceRow {
        name,
        balance: fields.get("balance").cloned().unwrap_or(Value::Null),
    })
}
