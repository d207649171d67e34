/// Render a position in seconds as `M:SS`.
///
/// Unknown, non-finite and negative inputs render as `0:00`.
pub fn format_time(seconds: Option<f64>) -> String {
    let seconds = match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => return "0:00".to_string(),
    };
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
