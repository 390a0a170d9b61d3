//! Reduces a set of records to the totals shown in summary cards and charts.
//!
//! Every function here is a pure reduction over its input. Numbers are not
//! rounded, formatting is left to the views.

use std::collections::BTreeMap;

use time::{Date, UtcOffset};

use crate::record::{CoffeeType, Kind, PaymentStatus, Record};

/// The running totals for a group of records.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    /// The sum of the unit prices.
    pub price: f64,
    /// The sum of the weights in grams.
    pub weight: f64,
    /// The number of records.
    pub count: usize,
}

impl Totals {
    fn add(&mut self, record: &Record) {
        self.price += record.price;
        self.weight += record.weight;
        self.count += 1;
    }
}

/// Totals split by the direction of the transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct KindTotals {
    pub purchase: Totals,
    pub sale: Totals,
}

impl KindTotals {
    /// The weight bought minus the weight sold, in grams.
    pub fn net_weight(&self) -> f64 {
        self.purchase.weight - self.sale.weight
    }
}

/// The aggregate figures for a set of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Records without a recognised kind are counted in neither total.
    pub by_kind: KindTotals,
    /// Record counts per payment status. Paid and pending are always present.
    pub by_payment_status: BTreeMap<PaymentStatus, usize>,
    /// Weight in grams per coffee type. Every [CoffeeType] is always present.
    pub by_coffee_type: BTreeMap<CoffeeType, f64>,
}

impl Summary {
    /// The number of records with the given payment status.
    pub fn payment_status_count(&self, status: &PaymentStatus) -> usize {
        self.by_payment_status.get(status).copied().unwrap_or(0)
    }
}

/// Compute the [Summary] of `records`.
pub fn aggregate(records: &[&Record]) -> Summary {
    let mut by_kind = KindTotals::default();
    let mut by_payment_status =
        BTreeMap::from([(PaymentStatus::Paid, 0), (PaymentStatus::Pending, 0)]);
    let mut by_coffee_type: BTreeMap<CoffeeType, f64> = CoffeeType::ALL
        .into_iter()
        .map(|coffee_type| (coffee_type, 0.0))
        .collect();

    for record in records {
        match record.kind {
            Some(Kind::Purchase) => by_kind.purchase.add(record),
            Some(Kind::Sale) => by_kind.sale.add(record),
            None => {}
        }

        *by_payment_status
            .entry(record.payment_status.clone())
            .or_default() += 1;

        if let Some(coffee_type) = record.coffee_type() {
            *by_coffee_type.entry(coffee_type).or_default() += record.weight;
        }
    }

    Summary {
        by_kind,
        by_payment_status,
        by_coffee_type,
    }
}

/// The chart series for the weight per coffee type, as labels and values in
/// the order of [CoffeeType::ALL].
pub fn coffee_type_series(summary: &Summary) -> (Vec<String>, Vec<f64>) {
    CoffeeType::ALL
        .into_iter()
        .map(|coffee_type| {
            let weight = summary
                .by_coffee_type
                .get(&coffee_type)
                .copied()
                .unwrap_or(0.0);

            (coffee_type.label().to_owned(), weight)
        })
        .unzip()
}

/// The total price of sales per local calendar date, in ascending date order.
///
/// Records without a valid creation date are skipped.
pub fn daily_sales(records: &[&Record], local_offset: UtcOffset) -> Vec<(Date, f64)> {
    let mut totals: BTreeMap<Date, f64> = BTreeMap::new();

    for record in records {
        if record.kind != Some(Kind::Sale) {
            continue;
        }

        if let Some(date) = record.local_date(local_offset) {
            *totals.entry(date).or_default() += record.total_price;
        }
    }

    totals.into_iter().collect()
}

/// The total price of the sales made on `date`.
pub fn sales_total_on(records: &[&Record], date: Date, local_offset: UtcOffset) -> f64 {
    records
        .iter()
        .filter(|record| record.kind == Some(Kind::Sale))
        .filter(|record| record.local_date(local_offset) == Some(date))
        .map(|record| record.total_price)
        .sum()
}
