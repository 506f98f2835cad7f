//! Pearson correlation and first-maximum selection shared by key estimation
//! and chord recognition.

/// Pearson correlation coefficient between two 12-element arrays.
///
/// Returns `None` when either side has zero variance (or contains
/// non-finite values), where the coefficient is undefined.
pub fn pearson(x: &[f64; 12], y: &[f64; 12]) -> Option<f64> {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if !denom.is_finite() || denom <= 0.0 {
        return None;
    }

    let r = num / denom;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Pick the highest-scoring candidate, keeping the earliest on ties.
///
/// Undefined scores never beat a defined one. If every score is undefined the
/// first candidate is returned. Returns `None` only for an empty iterator.
pub fn first_max<T>(
    candidates: impl IntoIterator<Item = (Option<f64>, T)>,
) -> Option<(Option<f64>, T)> {
    let mut best: Option<(Option<f64>, T)> = None;

    for (score, item) in candidates {
        let replace = match (&best, score) {
            (None, _) => true,
            (Some((None, _)), Some(_)) => true,
            (Some((Some(current), _)), Some(s)) => s > *current,
            _ => false,
        };
        if replace {
            best = Some((score, item));
        }
    }

    best
}
