/// CSV export of held-out predictions.
pub mod export;
