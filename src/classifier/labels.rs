use std::borrow::Cow;
use std::collections::BTreeMap;

/// Denomination names indexed by the classifier's output position.
pub const BILL_LABELS: [&str; 12] = [
    "1 USD",
    "5 USD",
    "10 USD",
    "20 USD",
    "50 USD",
    "100 USD",
    "500 CDF",
    "1000 CDF",
    "5000 CDF",
    "10000 CDF",
    "20000 CDF",
    "50000 CDF",
];

pub fn label_for(index: usize) -> Cow<'static, str> {
    match BILL_LABELS.get(index) {
        Some(label) => Cow::Borrowed(label),
        None => Cow::Owned(format!("unknown class {}", index)),
    }
}

pub fn label_table() -> BTreeMap<usize, &'static str> {
    BILL_LABELS.iter().copied().enumerate().collect()
}
