//! Context-pressure → buffer-cap / summary-injection-cap table (spec §5),
//! grounded in the source's `_safe_max_from_pressure` thresholds.

/// Maximum exchanges retained in the buffer at a given pressure level.
#[must_use]
pub fn buffer_cap(pressure_percent: f32) -> usize {
    if pressure_percent >= 85.0 {
        10
    } else if pressure_percent >= 80.0 {
        15
    } else if pressure_percent >= 70.0 {
        20
    } else if pressure_percent >= 60.0 {
        25
    } else if pressure_percent >= 50.0 {
        30
    } else {
        35
    }
}

/// Token budget for summary injection at a given pressure level.
#[must_use]
pub fn summary_injection_cap(pressure_percent: f32) -> usize {
    if pressure_percent >= 85.0 {
        1000
    } else if pressure_percent >= 80.0 {
        1500
    } else if pressure_percent >= 70.0 {
        2000
    } else if pressure_percent >= 60.0 {
        3000
    } else if pressure_percent >= 50.0 {
        4000
    } else {
        5000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_monotonicity_holds_across_thresholds() {
        let samples = [0.0, 49.0, 50.0, 59.0, 60.0, 69.0, 70.0, 79.0, 80.0, 84.0, 85.0, 100.0];
        for window in samples.windows(2) {
            let (p1, p2) = (window[0], window[1]);
            if p1 < p2 {
                assert!(buffer_cap(p1) >= buffer_cap(p2), "cap({p1}) >= cap({p2})");
            }
        }
    }

    #[test]
    fn default_pressure_uses_widest_cap() {
        assert_eq!(buffer_cap(0.0), 35);
        assert_eq!(summary_injection_cap(0.0), 5000);
    }
}
