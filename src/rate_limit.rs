//! Rate limits for calls to the enrichment APIs, written as `10/s` or
//! `100/m`.

use std::{fmt, str::FromStr, time::Duration};

use leaky_bucket::RateLimiter;

use crate::prelude::*;

/// The period over which the rate limit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitPeriod {
    /// Per second.
    Second,
    /// Per minute.
    Minute,
}

impl RateLimitPeriod {
    /// The length of this period.
    pub fn to_duration(self) -> Duration {
        match self {
            RateLimitPeriod::Second => Duration::from_secs(1),
            RateLimitPeriod::Minute => Duration::from_secs(60),
        }
    }
}

impl fmt::Display for RateLimitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitPeriod::Second => write!(f, "s"),
            RateLimitPeriod::Minute => write!(f, "m"),
        }
    }
}

impl FromStr for RateLimitPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s" => Ok(RateLimitPeriod::Second),
            "m" => Ok(RateLimitPeriod::Minute),
            _ => Err(anyhow!("Unsupported rate limit period: {:?}", s)),
        }
    }
}

/// A maximum number of requests per period.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimit {
    /// The maximum number of requests allowed in the period. Never zero.
    pub max_requests: usize,
    /// The period over which the rate limit is applied.
    pub per_period: RateLimitPeriod,
}

impl RateLimit {
    /// How long to wait between refilling single tokens.
    pub fn refill_interval(&self) -> Duration {
        let interval = self.per_period.to_duration() / self.max_requests as u32;
        interval.max(Duration::from_millis(1))
    }

    /// Create a [`RateLimiter`] for this rate limit.
    ///
    /// The bucket starts full, then refills one token at a time, so a limit
    /// of `60/m` allows a burst of 60 followed by one request per second.
    pub fn to_rate_limiter(&self) -> RateLimiter {
        RateLimiter::builder()
            .initial(self.max_requests)
            .max(self.max_requests)
            .refill(1)
            .interval(self.refill_interval())
            .build()
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.max_requests, self.per_period)
    }
}

impl FromStr for RateLimit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |s: &str| -> Result<_> {
            let (count, period) = s
                .split_once('/')
                .ok_or_else(|| anyhow!("Expected a value like \"10/s\""))?;
            let max_requests = count.trim().parse::<usize>()?;
            if max_requests == 0 || u32::try_from(max_requests).is_err() {
                return Err(anyhow!("Request count must be between 1 and {}", u32::MAX));
            }
            let per_period = period.trim().parse::<RateLimitPeriod>()?;
            Ok(Self {
                max_requests,
                per_period,
            })
        };
        parse(s).with_context(|| format!("Failed to parse rate limit: {:?}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let rate_limit = RateLimit::from_str("10/s").unwrap();
        assert_eq!(rate_limit.max_requests, 10);
        assert_eq!(rate_limit.per_period, RateLimitPeriod::Second);

        let rate_limit = RateLimit::from_str("30 / m").unwrap();
        assert_eq!(rate_limit.max_requests, 30);
        assert_eq!(rate_limit.per_period, RateLimitPeriod::Minute);
    }

    #[test]
    fn test_failed_parse() {
        for bad in ["10/invalid", "invalid", "0/s", "-1/s", "/s"] {
            assert!(RateLimit::from_str(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RateLimit::from_str("10/s").unwrap().to_string(), "10/s");
        assert_eq!(RateLimit::from_str("5/m").unwrap().to_string(), "5/m");
    }

    #[test]
    fn test_refill_interval() {
        let per_minute = RateLimit::from_str("30/m").unwrap();
        assert_eq!(per_minute.refill_interval(), Duration::from_secs(2));

        let very_fast = RateLimit::from_str("100000/s").unwrap();
        assert_eq!(very_fast.refill_interval(), Duration::from_millis(1));
    }
}
