use std::collections::HashMap;

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{EntryType, LedgerEntry, round2};

/// Payments later than this many days after the purchase attract interest;
/// purchases still unpaid past it require ITC reversal. Strictly greater-than:
/// exactly 180 days never qualifies.
pub const DAYS_THRESHOLD: i64 = 180;

/// Still-unpaid purchases past this many days (but within the 180-day
/// deadline) are counted as at risk without producing an interest row.
pub const AT_RISK_THRESHOLD: i64 = 150;

/// Assumptions behind the computed liability, shown alongside results.
pub const DISCLAIMER: &str = "Interest calculated from invoice date. Per Section 50 + Rule 88B, \
     actual interest depends on ITC availment and utilization dates. \
     Consult CA for precise liability.";

/// Terminal classification of a purchase slice that crossed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestStatus {
    /// Matched against a payment more than 180 days after the purchase.
    PaidLate,
    /// No (or insufficient) matching payment as of the calculation date.
    Unpaid,
}

/// One computed interest line: a purchase slice that crossed the 180-day
/// threshold, either when finally paid or still outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestRow {
    pub supplier: String,
    pub purchase_date: NaiveDate,
    /// None iff status is Unpaid.
    pub payment_date: Option<NaiveDate>,
    pub principal: Decimal,
    pub delay_days: i64,
    pub itc_amount: Decimal,
    pub interest: Decimal,
    pub status: InterestStatus,
    /// Last day the purchase could have been paid without consequences.
    pub payment_deadline: NaiveDate,
    /// GSTR-3B return period in which the reversal falls (month after the
    /// deadline), e.g. "Jul 2023".
    pub reversal_period: String,
    /// Days from the calculation date to the deadline; negative once breached.
    pub days_to_deadline: i64,
}

/// Aggregated result of one calculation over a single ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_interest: Decimal,
    pub total_itc_reversal: Decimal,
    pub details: Vec<InterestRow>,
    /// Purchases unpaid for 151-180 days as of the calculation date: no row
    /// yet, but the reversal liability materializes within a month.
    pub at_risk_count: usize,
    pub at_risk_amount: Decimal,
    /// Number of Unpaid rows (purchases outstanding past the deadline).
    pub breached_count: usize,
    pub calculation_date: NaiveDate,
}

/// Calculation result for one ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerResult {
    pub ledger_name: String,
    pub summary: CalculationSummary,
}

/// A purchase or payment waiting to be matched. `remaining` is decremented
/// in place as slices are matched.
#[derive(Debug, Clone)]
struct OpenItem {
    date: NaiveDate,
    remaining: Decimal,
}

/// FIFO queue as a front cursor over a vector: the head is consumed by
/// decrementing `remaining` and advancing once it reaches zero, so matching
/// allocates nothing per iteration.
#[derive(Debug, Default)]
struct FifoQueue {
    items: Vec<OpenItem>,
    head: usize,
}

impl FifoQueue {
    fn push(&mut self, date: NaiveDate, amount: Decimal) {
        self.items.push(OpenItem {
            date,
            remaining: amount,
        });
    }

    fn front(&self) -> Option<&OpenItem> {
        self.items.get(self.head)
    }

    fn reduce_front(&mut self, amount: Decimal) {
        if let Some(item) = self.items.get_mut(self.head) {
            item.remaining -= amount;
            if item.remaining <= Decimal::ZERO {
                self.head += 1;
            }
        }
    }

    /// Items not yet fully matched, oldest first.
    fn open_items(&self) -> &[OpenItem] {
        &self.items[self.head..]
    }
}

/// Purchase and payment queues for one supplier. Insertion follows the
/// date-sorted entry order, so each queue is itself date-ordered.
#[derive(Debug, Default)]
struct SupplierQueues {
    purchases: FifoQueue,
    payments: FifoQueue,
}

/// Compute delayed-payment interest and ITC reversal for the given entries.
///
/// Pure and deterministic: stable date sort, FIFO purchase/payment matching
/// per supplier with partial-amount splitting, then classification of
/// leftover purchases against `as_on_date`. Formulas:
/// ITC = principal x 18/118, interest = ITC x 0.18 x delay/365, both
/// rounded to two decimals at each stage.
pub fn calculate(entries: &[LedgerEntry], as_on_date: NaiveDate) -> CalculationSummary {
    let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    // Partition per supplier, keeping first-appearance order so detail rows
    // come out in a reproducible order.
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut suppliers: Vec<(&str, SupplierQueues)> = Vec::new();
    for entry in sorted {
        let i = *index.entry(entry.supplier.as_str()).or_insert_with(|| {
            suppliers.push((entry.supplier.as_str(), SupplierQueues::default()));
            suppliers.len() - 1
        });
        let queues = &mut suppliers[i].1;
        match entry.entry_type {
            EntryType::Purchase => queues.purchases.push(entry.date, entry.amount),
            EntryType::Payment => queues.payments.push(entry.date, entry.amount),
        }
    }

    let mut details = Vec::new();
    let mut at_risk_count = 0usize;
    let mut at_risk_amount = Decimal::ZERO;

    for (supplier, queues) in &mut suppliers {
        match_fifo(supplier, queues, as_on_date, &mut details);
        settle_leftover_purchases(
            supplier,
            &queues.purchases,
            as_on_date,
            &mut details,
            &mut at_risk_count,
            &mut at_risk_amount,
        );
    }

    let total_interest = round2(details.iter().map(|r| r.interest).sum());
    let total_itc_reversal = round2(
        details
            .iter()
            .filter(|r| r.status == InterestStatus::Unpaid)
            .map(|r| r.itc_amount)
            .sum(),
    );
    let breached_count = details
        .iter()
        .filter(|r| r.status == InterestStatus::Unpaid)
        .count();

    CalculationSummary {
        total_interest,
        total_itc_reversal,
        details,
        at_risk_count,
        at_risk_amount: round2(at_risk_amount),
        breached_count,
        calculation_date: as_on_date,
    }
}

/// Match the oldest open purchase against the oldest open payment until one
/// queue runs dry, emitting a PaidLate row for every slice settled more than
/// 180 days after the purchase. Amounts are always consumed, row or not.
fn match_fifo(
    supplier: &str,
    queues: &mut SupplierQueues,
    as_on_date: NaiveDate,
    results: &mut Vec<InterestRow>,
) {
    while let (Some(purchase), Some(payment)) =
        (queues.purchases.front(), queues.payments.front())
    {
        let matched = purchase.remaining.min(payment.remaining);
        let delay_days = days_between(purchase.date, payment.date);

        if delay_days > DAYS_THRESHOLD {
            results.push(build_row(
                supplier,
                purchase.date,
                Some(payment.date),
                matched,
                delay_days,
                InterestStatus::PaidLate,
                as_on_date,
            ));
        }

        queues.purchases.reduce_front(matched);
        queues.payments.reduce_front(matched);
    }
}

/// Classify purchases left after matching: past the threshold they become
/// Unpaid rows with their full remaining principal; inside the 151-180 day
/// window they only feed the at-risk counters.
fn settle_leftover_purchases(
    supplier: &str,
    purchases: &FifoQueue,
    as_on_date: NaiveDate,
    results: &mut Vec<InterestRow>,
    at_risk_count: &mut usize,
    at_risk_amount: &mut Decimal,
) {
    for item in purchases.open_items() {
        let delay_days = days_between(item.date, as_on_date);
        if delay_days > DAYS_THRESHOLD {
            results.push(build_row(
                supplier,
                item.date,
                None,
                item.remaining,
                delay_days,
                InterestStatus::Unpaid,
                as_on_date,
            ));
        } else if delay_days > AT_RISK_THRESHOLD {
            *at_risk_count += 1;
            *at_risk_amount += item.remaining;
        }
    }
}

fn build_row(
    supplier: &str,
    purchase_date: NaiveDate,
    payment_date: Option<NaiveDate>,
    principal: Decimal,
    delay_days: i64,
    status: InterestStatus,
    as_on_date: NaiveDate,
) -> InterestRow {
    let itc_amount = round2(principal * dec!(18) / dec!(118));
    let interest = round2(itc_amount * dec!(0.18) * Decimal::from(delay_days) / dec!(365));
    let payment_deadline = purchase_date + Duration::days(DAYS_THRESHOLD);

    InterestRow {
        supplier: supplier.to_string(),
        purchase_date,
        payment_date,
        principal,
        delay_days,
        itc_amount,
        interest,
        status,
        payment_deadline,
        reversal_period: reversal_period(payment_deadline),
        days_to_deadline: days_between(as_on_date, payment_deadline),
    }
}

/// Return period in which the reversal is reported: the month after the
/// payment deadline, rendered as short month + year.
fn reversal_period(deadline: NaiveDate) -> String {
    let reporting = deadline
        .checked_add_months(Months::new(1))
        .unwrap_or(deadline);
    reporting.format("%b %Y").to_string()
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn purchase(d: &str, supplier: &str, amount: Decimal) -> LedgerEntry {
        LedgerEntry::new(date(d), EntryType::Purchase, supplier, amount)
    }

    fn payment(d: &str, supplier: &str, amount: Decimal) -> LedgerEntry {
        LedgerEntry::new(date(d), EntryType::Payment, supplier, amount)
    }

    #[test]
    fn test_payment_within_threshold_produces_no_rows() {
        // 2023-01-01 + 180 days = 2023-06-30: exactly on the threshold.
        let entries = vec![
            purchase("2023-01-01", "Acme", dec!(100000)),
            payment("2023-06-30", "Acme", dec!(100000)),
        ];
        let summary = calculate(&entries, date("2023-12-31"));

        assert!(summary.details.is_empty());
        assert_eq!(summary.total_interest, dec!(0));
        assert_eq!(summary.total_itc_reversal, dec!(0));
    }

    #[test]
    fn test_one_day_past_threshold_produces_paid_late_row() {
        let entries = vec![
            purchase("2023-01-01", "Acme", dec!(100000)),
            payment("2023-07-01", "Acme", dec!(100000)),
        ];
        let summary = calculate(&entries, date("2023-12-31"));

        assert_eq!(summary.details.len(), 1);
        let row = &summary.details[0];
        assert_eq!(row.status, InterestStatus::PaidLate);
        assert_eq!(row.delay_days, 181);
    }

    #[test]
    fn test_paid_late_scenario() {
        // 212-day delay: ITC = round(100000 * 18/118) = 15254.24,
        // interest = round(15254.24 * 0.18 * 212/365) = 1594.80.
        let entries = vec![
            purchase("2023-01-01", "Acme", dec!(100000)),
            payment("2023-08-01", "Acme", dec!(100000)),
        ];
        let summary = calculate(&entries, date("2023-08-01"));

        assert_eq!(summary.details.len(), 1);
        let row = &summary.details[0];
        assert_eq!(row.status, InterestStatus::PaidLate);
        assert_eq!(row.payment_date, Some(date("2023-08-01")));
        assert_eq!(row.delay_days, 212);
        assert_eq!(row.principal, dec!(100000));
        assert_eq!(row.itc_amount, dec!(15254.24));
        assert_eq!(row.interest, dec!(1594.80));
        assert_eq!(summary.total_interest, dec!(1594.80));
        // Paid late means the reversal obligation lapsed.
        assert_eq!(summary.total_itc_reversal, dec!(0));
        assert_eq!(summary.breached_count, 0);
    }

    #[test]
    fn test_unpaid_scenario() {
        let entries = vec![purchase("2023-01-01", "Acme", dec!(100000))];
        let summary = calculate(&entries, date("2023-08-01"));

        assert_eq!(summary.details.len(), 1);
        let row = &summary.details[0];
        assert_eq!(row.status, InterestStatus::Unpaid);
        assert_eq!(row.payment_date, None);
        assert_eq!(row.delay_days, 212);
        assert_eq!(row.itc_amount, dec!(15254.24));
        assert_eq!(row.interest, dec!(1594.80));
        assert_eq!(summary.total_itc_reversal, dec!(15254.24));
        assert_eq!(summary.breached_count, 1);
    }

    #[test]
    fn test_partial_amount_splitting() {
        // First payment lands inside the threshold, second far outside:
        // only the second slice produces a row.
        let entries = vec![
            purchase("2022-01-01", "Acme", dec!(1000)),
            payment("2022-04-11", "Acme", dec!(400)),
            payment("2022-07-20", "Acme", dec!(600)),
        ];
        let summary = calculate(&entries, date("2023-01-01"));

        assert_eq!(summary.details.len(), 1);
        let row = &summary.details[0];
        assert_eq!(row.status, InterestStatus::PaidLate);
        assert_eq!(row.principal, dec!(600));
        assert_eq!(row.delay_days, days_between(date("2022-01-01"), date("2022-07-20")));
    }

    #[test]
    fn test_matching_conservation() {
        // Purchases 1000 + 2000, payment 1500: matched slices (1000 + 500)
        // plus the unpaid remainder (1500) account for every rupee.
        let entries = vec![
            purchase("2022-01-01", "Acme", dec!(1000)),
            purchase("2022-01-02", "Acme", dec!(2000)),
            payment("2022-12-31", "Acme", dec!(1500)),
        ];
        let summary = calculate(&entries, date("2023-12-31"));

        let paid_late: Decimal = summary
            .details
            .iter()
            .filter(|r| r.status == InterestStatus::PaidLate)
            .map(|r| r.principal)
            .sum();
        let unpaid: Decimal = summary
            .details
            .iter()
            .filter(|r| r.status == InterestStatus::Unpaid)
            .map(|r| r.principal)
            .sum();

        assert_eq!(paid_late, dec!(1500));
        assert_eq!(unpaid, dec!(1500));
        assert_eq!(paid_late + unpaid, dec!(3000));
        // FIFO: the oldest purchase is fully consumed first.
        assert_eq!(summary.details[0].purchase_date, date("2022-01-01"));
        assert_eq!(summary.details[0].principal, dec!(1000));
    }

    #[test]
    fn test_reversal_total_excludes_paid_late_rows() {
        let entries = vec![
            purchase("2022-01-01", "Acme", dec!(50000)),
            payment("2022-12-01", "Acme", dec!(50000)),
            purchase("2022-02-01", "Globex", dec!(30000)),
        ];
        let summary = calculate(&entries, date("2023-06-01"));

        let paid_late_itc: Decimal = summary
            .details
            .iter()
            .filter(|r| r.status == InterestStatus::PaidLate)
            .map(|r| r.itc_amount)
            .sum();
        assert!(paid_late_itc > dec!(0));

        let expected = round2(dec!(30000) * dec!(18) / dec!(118));
        assert_eq!(summary.total_itc_reversal, expected);
    }

    #[test]
    fn test_suppliers_matched_independently() {
        // Globex's payment must not settle Acme's purchase.
        let entries = vec![
            purchase("2022-01-01", "Acme", dec!(1000)),
            payment("2022-12-31", "Globex", dec!(1000)),
        ];
        let summary = calculate(&entries, date("2023-12-31"));

        assert_eq!(summary.details.len(), 1);
        assert_eq!(summary.details[0].supplier, "Acme");
        assert_eq!(summary.details[0].status, InterestStatus::Unpaid);
    }

    #[test]
    fn test_payment_only_supplier_produces_no_rows() {
        let entries = vec![payment("2022-01-01", "Acme", dec!(5000))];
        let summary = calculate(&entries, date("2023-12-31"));

        assert!(summary.details.is_empty());
        assert_eq!(summary.total_interest, dec!(0));
    }

    #[test]
    fn test_unsorted_input_still_matches_oldest_first() {
        let entries = vec![
            purchase("2022-06-01", "Acme", dec!(700)),
            payment("2023-01-15", "Acme", dec!(700)),
            purchase("2022-01-01", "Acme", dec!(700)),
        ];
        let summary = calculate(&entries, date("2023-12-31"));

        // The payment settles the January purchase (379 days late); the June
        // purchase stays unpaid.
        assert_eq!(summary.details.len(), 2);
        assert_eq!(summary.details[0].status, InterestStatus::PaidLate);
        assert_eq!(summary.details[0].purchase_date, date("2022-01-01"));
        assert_eq!(summary.details[1].status, InterestStatus::Unpaid);
        assert_eq!(summary.details[1].purchase_date, date("2022-06-01"));
    }

    #[test]
    fn test_at_risk_window() {
        // 160 days outstanding: counted at risk, no row.
        let entries = vec![purchase("2023-01-01", "Acme", dec!(20000))];
        let summary = calculate(&entries, date("2023-01-01") + Duration::days(160));

        assert!(summary.details.is_empty());
        assert_eq!(summary.at_risk_count, 1);
        assert_eq!(summary.at_risk_amount, dec!(20000));
        assert_eq!(summary.breached_count, 0);

        // One day past the deadline it becomes a breach instead.
        let summary = calculate(&entries, date("2023-01-01") + Duration::days(181));
        assert_eq!(summary.at_risk_count, 0);
        assert_eq!(summary.details.len(), 1);
        assert_eq!(summary.breached_count, 1);
    }

    #[test]
    fn test_deadline_metadata() {
        let entries = vec![purchase("2023-01-01", "Acme", dec!(100000))];
        let summary = calculate(&entries, date("2023-08-01"));

        let row = &summary.details[0];
        assert_eq!(row.payment_deadline, date("2023-06-30"));
        assert_eq!(row.reversal_period, "Jul 2023");
        assert_eq!(row.days_to_deadline, -32);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let entries = vec![
            purchase("2022-01-01", "Acme", dec!(1000)),
            purchase("2022-03-01", "Globex", dec!(2500)),
            payment("2022-11-01", "Acme", dec!(400)),
            payment("2023-01-01", "Globex", dec!(2500)),
        ];
        let first = calculate(&entries, date("2023-06-01"));
        let second = calculate(&entries, date("2023-06-01"));

        assert_eq!(first, second);
    }
}
