//! Wall-clock source for receipt and last-updated stamps

use chrono::{Local, NaiveDateTime};
use smrt_common::types::Stamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn stamp(&self) -> Stamp {
        Stamp::from_datetime(self.now())
    }
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
