//! Text formatting for monitor stats

use crate::liveness::Observation;

pub const PLACEHOLDER: &str = "--";

/// FPS with one decimal place, or a placeholder before the first estimate.
pub fn format_fps(fps_ema: f64) -> String {
    if fps_ema == 0.0 {
        PLACEHOLDER.to_string()
    } else {
        format!("{:.1}", fps_ema)
    }
}

/// Age rounded to whole milliseconds, or a placeholder when infinite.
pub fn format_age(age_ms: Option<i64>) -> String {
    match age_ms {
        Some(age) => age.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn stats_line(obs: &Observation) -> String {
    format!(
        "fps={}  age={}ms",
        format_fps(obs.fps_ema),
        format_age(obs.age_ms)
    )
}

/// Line shown when no heartbeat could be fetched at all.
pub fn unreachable_line() -> String {
    format!("fps={PLACEHOLDER}  age={PLACEHOLDER}ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_formatting() {
        assert_eq!(format_fps(0.0), "--");
        assert_eq!(format_fps(5.0), "5.0");
        assert_eq!(format_fps(29.97), "30.0");
        assert_eq!(format_fps(12.34), "12.3");
    }

    #[test]
    fn test_age_formatting() {
        assert_eq!(format_age(None), "--");
        assert_eq!(format_age(Some(0)), "0");
        assert_eq!(format_age(Some(1234)), "1234");
    }

    #[test]
    fn test_stats_line() {
        let obs = Observation {
            alive: true,
            fps_ema: 5.0,
            age_ms: Some(120),
        };
        assert_eq!(stats_line(&obs), "fps=5.0  age=120ms");

        let never = Observation {
            alive: false,
            fps_ema: 0.0,
            age_ms: None,
        };
        assert_eq!(stats_line(&never), "fps=--  age=--ms");
        assert_eq!(unreachable_line(), "fps=--  age=--ms");
    }
}
