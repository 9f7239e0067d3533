//! Display helpers shared by the CLI and reports.

/// `mm:ss`; negative input shows as `00:00`. Minutes are not wrapped
/// into hours.
pub fn format_duration(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}

pub fn format_one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

pub fn format_two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(75), "01:15");
        assert_eq!(format_duration(-5), "00:00");
        assert_eq!(format_duration(6_000), "100:00");
    }

    #[test]
    fn decimals() {
        assert_eq!(format_one_decimal(2.26), "2.3");
        assert_eq!(format_one_decimal(0.0), "0.0");
        assert_eq!(format_two_decimals(1.4), "1.40");
        assert_eq!(format_two_decimals(0.456), "0.46");
    }
}
