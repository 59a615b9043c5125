// Drop alert: compares a fresh price with the trailing average of stored prices.

use std::fmt;

pub const DEFAULT_THRESHOLD_PERCENT: f64 = 1.0;

// Absorbs float noise so a drop of exactly the threshold still fires.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// ntfy-style delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPriority {
    Default,
    High,
    Urgent,
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertPriority::Default => f.write_str("default"),
            AlertPriority::High => f.write_str("high"),
            AlertPriority::Urgent => f.write_str("urgent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
    pub priority: AlertPriority,
}

/// Relative decrease of `current` below `average`, in percent. Negative when
/// the price rose.
pub fn drop_percentage(current: f64, average: f64) -> f64 {
    (average - current) * 100.0 / average
}

#[derive(Debug, Clone, Copy)]
pub struct AlertRule {
    pub threshold_percent: f64,
}

impl Default for AlertRule {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl AlertRule {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    /// Fires only on a drop of at least the threshold. An unchanged price, no
    /// history, or a non-positive average never fires, even at a 0% threshold.
    pub fn should_alert(&self, current: f64, trailing_average: Option<f64>) -> bool {
        match trailing_average {
            Some(avg) if avg > 0.0 => {
                let drop = drop_percentage(current, avg);
                drop > 0.0 && drop >= self.threshold_percent - THRESHOLD_EPSILON
            }
            _ => false,
        }
    }

    /// Deeper drops get a louder notification.
    pub fn priority_for(&self, drop_percent: f64) -> AlertPriority {
        let ratio = if self.threshold_percent > 0.0 {
            drop_percent / self.threshold_percent
        } else {
            1.0
        };

        if ratio >= 5.0 {
            AlertPriority::Urgent
        } else if ratio >= 2.0 {
            AlertPriority::High
        } else {
            AlertPriority::Default
        }
    }

    pub fn build_message(
        &self,
        karat: &str,
        city: &str,
        current: f64,
        average: f64,
        trailing_days: i64,
    ) -> AlertMessage {
        let drop = drop_percentage(current, average);
        AlertMessage {
            title: format!("Gold price drop: {} {}", karat, city),
            body: format!(
                "{} gold in {} is now ₹{:.2} per 10g, {:.2}% below the {}-day average of ₹{:.2}.",
                karat, city, current, drop, trailing_days, average
            ),
            priority: self.priority_for(drop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn should_alert(current: f64, average: f64) -> bool {
        AlertRule::default().should_alert(current, Some(average))
    }

    #[test]
    fn test_drop_at_threshold_fires() {
        assert!(should_alert(99.0, 100.0));
    }

    #[test]
    fn test_zero_threshold_needs_an_actual_drop() {
        let rule = AlertRule::new(0.0);
        assert!(!rule.should_alert(100.0, Some(100.0)));
        assert!(!rule.should_alert(100.5, Some(100.0)));
        assert!(rule.should_alert(99.99, Some(100.0)));
    }

    #[test]
    fn test_drop_below_threshold_does_not_fire() {
        assert!(!should_alert(99.5, 100.0));
    }

    #[test]
    fn test_rise_never_fires() {
        assert!(!should_alert(101.0, 100.0));
        assert!(!AlertRule::new(0.0).should_alert(101.0, Some(100.0)));
    }

    #[test]
    fn test_no_history_never_fires() {
        assert!(!AlertRule::default().should_alert(1.0, None));
        assert!(!AlertRule::default().should_alert(1.0, Some(0.0)));
    }

    #[test]
    fn test_realistic_drop() {
        assert!(should_alert(132000.0, 150000.0));
        assert!((drop_percentage(132000.0, 150000.0) - 12.0).abs() < 1e-9);
        assert!(!should_alert(149000.0, 150000.0));
    }

    #[test]
    fn test_priority_scales_with_drop() {
        let rule = AlertRule::default();
        assert_eq!(rule.priority_for(1.0), AlertPriority::Default);
        assert_eq!(rule.priority_for(3.0), AlertPriority::High);
        assert_eq!(rule.priority_for(12.0), AlertPriority::Urgent);
    }

    #[test]
    fn test_message_is_ascii_titled() {
        let msg = AlertRule::default().build_message("22K", "Hyderabad", 132000.0, 150000.0, 7);
        assert_eq!(msg.title, "Gold price drop: 22K Hyderabad");
        assert!(msg.title.is_ascii());
        assert!(msg.body.contains("12.00% below the 7-day average"));
        assert_eq!(msg.priority, AlertPriority::Urgent);
    }
}
